//! Symbol entries
//!
//! A [`SymbolEntry`] is one documented item as it appears in a shard: the
//! normalized key it is filed under, the label shown to the user, where it
//! points, and the context that tells apart entries sharing a label.
//!
//! Entries are immutable once decoded. The ordinal fields record generation
//! order so ranking can stay stable without re-reading the shard.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SymbolKind
// ============================================================================

/// Conceptual category of a documented item
///
/// Variant order is the display order of result groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Documentation page or section of a page
    Page,
    /// Topic group
    Group,
    /// Struct, class or union
    Type,
    /// Function
    Function,
    /// Preprocessor macro
    Macro,
    /// Variable or struct field
    Variable,
    /// Type alias
    Typedef,
}

impl SymbolKind {
    /// All kinds in display order
    pub const ALL: [SymbolKind; 7] = [
        SymbolKind::Page,
        SymbolKind::Group,
        SymbolKind::Type,
        SymbolKind::Function,
        SymbolKind::Macro,
        SymbolKind::Variable,
        SymbolKind::Typedef,
    ];

    /// Lowercase name used in shard files
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Page => "page",
            SymbolKind::Group => "group",
            SymbolKind::Type => "type",
            SymbolKind::Function => "function",
            SymbolKind::Macro => "macro",
            SymbolKind::Variable => "variable",
            SymbolKind::Typedef => "typedef",
        }
    }

    /// Parse a kind name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        SymbolKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
    }

    /// Infer the kind of an entry from where it points
    ///
    /// Generated pages follow a naming convention: `group_*` pages hold topic
    /// groups, `struct_*`/`class_*`/`union_*` pages hold types. An anchor on a
    /// type page is a field; an anchor on a group page is a macro when the
    /// label is upper snake case and a function otherwise.
    pub fn infer(target: &TargetUrl, display_name: &str) -> Self {
        let page = target.page_file_name();
        let is_type_page = ["struct_", "class_", "union_"]
            .iter()
            .any(|p| page.starts_with(p));
        if page.starts_with("group_") {
            match target.anchor() {
                None => SymbolKind::Group,
                Some(a) if a.starts_with("autotoc") => SymbolKind::Page,
                Some(_) if is_upper_snake(&plain_text(display_name)) => SymbolKind::Macro,
                Some(_) => SymbolKind::Function,
            }
        } else if is_type_page {
            match target.anchor() {
                None => SymbolKind::Type,
                Some(_) => SymbolKind::Variable,
            }
        } else {
            SymbolKind::Page
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_upper_snake(label: &str) -> bool {
    let mut saw_letter = false;
    for c in label.chars() {
        if c.is_ascii_lowercase() {
            return false;
        }
        if c.is_ascii_uppercase() {
            saw_letter = true;
        } else if !(c.is_ascii_digit() || c == '_') {
            return false;
        }
    }
    saw_letter
}

// ============================================================================
// TargetUrl
// ============================================================================

/// Page plus optional in-page anchor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct TargetUrl {
    page: String,
    anchor: Option<String>,
}

impl TargetUrl {
    /// Parse `page#anchor` or `page`
    ///
    /// An empty anchor (`page#`) is treated as no anchor.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('#') {
            Some((page, anchor)) if !anchor.is_empty() => TargetUrl {
                page: page.to_string(),
                anchor: Some(anchor.to_string()),
            },
            Some((page, _)) => TargetUrl {
                page: page.to_string(),
                anchor: None,
            },
            None => TargetUrl {
                page: raw.to_string(),
                anchor: None,
            },
        }
    }

    /// Page part, as written by the generator
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Anchor part, if any
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Page with generator-relative `../` and `./` segments removed
    pub fn site_page(&self) -> &str {
        let mut page = self.page.as_str();
        loop {
            if let Some(rest) = page.strip_prefix("../") {
                page = rest;
            } else if let Some(rest) = page.strip_prefix("./") {
                page = rest;
            } else {
                return page;
            }
        }
    }

    /// Last path segment of the page
    pub fn page_file_name(&self) -> &str {
        let page = self.site_page();
        page.rsplit('/').next().unwrap_or(page)
    }

    /// Same target without its anchor
    pub fn without_anchor(&self) -> TargetUrl {
        TargetUrl {
            page: self.page.clone(),
            anchor: None,
        }
    }

    /// Whether both point at the same site page, ignoring anchors and `../`
    pub fn same_page(&self, other: &TargetUrl) -> bool {
        self.site_page() == other.site_page()
    }

    /// Whether both point at the same location, ignoring `../`
    pub fn same_location(&self, other: &TargetUrl) -> bool {
        self.same_page(other) && self.anchor == other.anchor
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Some(a) => write!(f, "{}#{}", self.page, a),
            None => f.write_str(&self.page),
        }
    }
}

impl From<String> for TargetUrl {
    fn from(s: String) -> Self {
        TargetUrl::parse(&s)
    }
}

impl From<TargetUrl> for String {
    fn from(t: TargetUrl) -> Self {
        t.to_string()
    }
}

// ============================================================================
// SymbolEntry
// ============================================================================

/// One documented item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    /// Normalized search key the entry is filed under
    pub key: String,
    /// Original label, may contain markup
    pub display_name: String,
    /// Where selecting the entry leads
    pub target_url: TargetUrl,
    /// Owning type, file or group, if the generator recorded one
    pub scope: Option<String>,
    /// Conceptual category
    pub kind: SymbolKind,
}

impl SymbolEntry {
    /// Create an entry, inferring the kind when none is given
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        target_url: TargetUrl,
        scope: Option<String>,
        kind: Option<SymbolKind>,
    ) -> Self {
        let display_name = display_name.into();
        let kind = kind.unwrap_or_else(|| SymbolKind::infer(&target_url, &display_name));
        SymbolEntry {
            key: key.into(),
            display_name,
            target_url,
            scope: scope.filter(|s| !s.is_empty()),
            kind,
        }
    }

    /// Identity used to recognise the same item filed under several keys
    pub fn identity(&self) -> EntryIdentity<'_> {
        EntryIdentity {
            display_name: &self.display_name,
            target_url: &self.target_url,
            scope: self.scope.as_deref(),
        }
    }

    /// Display label with markup removed
    pub fn plain_label(&self) -> String {
        plain_text(&self.display_name)
    }

    /// Scope with markup removed
    pub fn plain_scope(&self) -> Option<String> {
        self.scope.as_deref().map(plain_text)
    }
}

/// Borrowed identity of a [`SymbolEntry`], independent of its search key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryIdentity<'a> {
    display_name: &'a str,
    target_url: &'a TargetUrl,
    scope: Option<&'a str>,
}

// ============================================================================
// Markup
// ============================================================================

/// Strip tags and decode the character references generators emit
///
/// Non-breaking spaces become plain spaces.
pub fn plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(c) = rest.chars().next() {
        match c {
            '<' => match rest.find('>') {
                Some(end) => rest = &rest[end + 1..],
                None => {
                    out.push_str(rest);
                    break;
                }
            },
            '&' => {
                let decoded = rest
                    .find(';')
                    .filter(|end| *end <= 10)
                    .and_then(|end| decode_entity(&rest[1..end]).map(|ch| (ch, end)));
                match decoded {
                    Some((ch, end)) => {
                        out.push(ch);
                        rest = &rest[end + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &rest[1..];
                    }
                }
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            if code == 160 {
                Some(' ')
            } else {
                char::from_u32(code)
            }
        }
    }
}
