//! Key normalization
//!
//! Every search key and every query goes through [`normalize`] before it is
//! compared, so matching is case-insensitive and punctuation-blind:
//! - Lowercase
//! - Non-alphanumeric characters become spaces
//! - Runs of spaces collapse to one, leading/trailing spaces are dropped

/// Normalize a label or query into a search key
///
/// # Example
///
/// ```
/// use docnav_core::normalize::normalize;
///
/// assert_eq!(normalize("BKPSRAM_BASEADDR"), "bkpsram baseaddr");
/// assert_eq!(normalize("  Bare-Metal  Philosophy "), "bare metal philosophy");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Split a normalized key into its whitespace-delimited tokens
pub fn tokens(key: &str) -> impl Iterator<Item = &str> {
    key.split(' ').filter(|t| !t.is_empty())
}

/// Byte offsets at which a token starts inside a normalized key
///
/// Offset 0 is always included for a non-empty key.
pub fn token_starts(key: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut at_boundary = true;
    for (i, c) in key.char_indices() {
        if c == ' ' {
            at_boundary = true;
        } else if at_boundary {
            starts.push(i);
            at_boundary = false;
        }
    }
    starts
}

/// Every token-aligned suffix of a normalized key, longest first
///
/// `"user button interrupt"` yields `"user button interrupt"`,
/// `"button interrupt"` and `"interrupt"`.
pub fn token_suffixes(key: &str) -> Vec<&str> {
    token_starts(key).into_iter().map(|i| &key[i..]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Hello, World!"), "hello world");
    }

    #[test]
    fn test_normalize_underscores_and_dashes() {
        assert_eq!(normalize("GPIO_PIN-NO_5"), "gpio pin no 5");
    }

    #[test]
    fn test_normalize_collapses_runs() {
        assert_eq!(normalize("a  --  b"), "a b");
        assert_eq!(normalize("...lead"), "lead");
        assert_eq!(normalize("trail..."), "trail");
    }

    #[test]
    fn test_normalize_empty_and_punctuation_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("...---..."), "");
    }

    #[test]
    fn test_normalize_keeps_digits() {
        assert_eq!(normalize("Project 002: User Button"), "project 002 user button");
    }

    #[test]
    fn test_token_starts() {
        assert_eq!(token_starts("ab cd ef"), vec![0, 3, 6]);
        assert!(token_starts("").is_empty());
    }

    #[test]
    fn test_token_suffixes() {
        assert_eq!(
            token_suffixes("user button interrupt"),
            vec!["user button interrupt", "button interrupt", "interrupt"]
        );
    }

    #[test]
    fn test_tokens() {
        let t: Vec<&str> = tokens("spi bit order").collect();
        assert_eq!(t, vec!["spi", "bit", "order"]);
    }
}
