//! Shard file codecs
//!
//! Two encodings are understood:
//! - [`ShardFormat::Json`]: `[[key, [[display, url, scope?, kind?], ...]], ...]`
//! - [`ShardFormat::Doxygen`]: generated `var searchData = [...]` scripts,
//!   `['escaped_key_N', ['Display', [url, 1, scope], ...]]`
//!
//! Decoding is lenient per record: a record or entry that fails to parse is
//! skipped and counted, the rest of the shard is kept. Only an unreadable
//! file (not JSON / not a script, or not a top-level array) fails the shard.

use crate::shard::{IndexShard, ShardRecord};
use docnav_core::{jsdata, normalize, Error, Result, ShardKey, ShardScheme, SymbolEntry, SymbolKind, TargetUrl};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Variable name holding the records in generated search scripts
pub const DOXYGEN_SEARCH_VAR: &str = "searchData";

/// Encoding of shard and descriptor files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShardFormat {
    /// Native JSON encoding
    #[default]
    Json,
    /// Generated `searchData` scripts
    Doxygen,
}

impl ShardFormat {
    /// Parse a format name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(ShardFormat::Json),
            "doxygen" => Some(ShardFormat::Doxygen),
            _ => None,
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a shard file
///
/// Records whose key does not belong to `key` under `scheme` are rejected as
/// malformed, so every entry lives in exactly one shard.
pub fn decode_shard(
    key: &ShardKey,
    scheme: &ShardScheme,
    bytes: &[u8],
    format: ShardFormat,
) -> Result<IndexShard> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::shard_load(key.clone(), format!("not UTF-8: {}", e)))?;
    let root = match format {
        ShardFormat::Json => serde_json::from_str::<Value>(text)
            .map_err(|e| Error::shard_load(key.clone(), e.to_string()))?,
        ShardFormat::Doxygen => jsdata::read_var(text, DOXYGEN_SEARCH_VAR)
            .map_err(|e| Error::shard_load(key.clone(), e.to_string()))?,
    };
    let raw_records = match root {
        Value::Array(items) => items,
        _ => return Err(Error::shard_load(key.clone(), "top level is not an array")),
    };

    let mut records = Vec::with_capacity(raw_records.len());
    let mut skipped = 0;
    for (index, raw) in raw_records.iter().enumerate() {
        let decoded = match format {
            ShardFormat::Json => decode_json_record(key, index, raw),
            ShardFormat::Doxygen => decode_doxygen_record(key, index, raw),
        };
        match decoded.and_then(|r| check_membership(key, scheme, index, r)) {
            Ok((record, bad_entries)) => {
                skipped += bad_entries;
                if !record.entries.is_empty() {
                    records.push(record);
                }
            }
            Err(e) => {
                tracing::warn!(target: "docnav::search", shard = %key, error = %e, "Skipping malformed record");
                skipped += 1;
            }
        }
    }

    Ok(IndexShard::new(key.clone(), records).with_skipped(skipped))
}

fn check_membership(
    key: &ShardKey,
    scheme: &ShardScheme,
    index: usize,
    decoded: (ShardRecord, usize),
) -> Result<(ShardRecord, usize)> {
    let owner = scheme.shard_key(&decoded.0.key);
    if &owner != key {
        return Err(Error::malformed(
            key.clone(),
            index,
            format!("key '{}' belongs to shard '{}'", decoded.0.key, owner),
        ));
    }
    Ok(decoded)
}

fn record_key(shard: &ShardKey, index: usize, raw_key: &str) -> Result<String> {
    let key = normalize(raw_key);
    if key.is_empty() {
        return Err(Error::malformed(shard.clone(), index, "empty key"));
    }
    Ok(key)
}

fn as_pair<'a>(shard: &ShardKey, index: usize, raw: &'a Value) -> Result<(&'a Value, &'a Value)> {
    match raw.as_array().map(Vec::as_slice) {
        Some([first, second, ..]) => Ok((first, second)),
        _ => Err(Error::malformed(shard.clone(), index, "expected [key, entries]")),
    }
}

fn opt_string(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Returns the record and the number of entries that were skipped inside it
fn decode_json_record(shard: &ShardKey, index: usize, raw: &Value) -> Result<(ShardRecord, usize)> {
    let (raw_key, raw_entries) = as_pair(shard, index, raw)?;
    let key = record_key(
        shard,
        index,
        raw_key
            .as_str()
            .ok_or_else(|| Error::malformed(shard.clone(), index, "key is not a string"))?,
    )?;
    let items = raw_entries
        .as_array()
        .ok_or_else(|| Error::malformed(shard.clone(), index, "entries is not an array"))?;

    let mut entries = Vec::with_capacity(items.len());
    let mut bad = 0;
    for item in items {
        match decode_json_entry(&key, item) {
            Some(entry) => entries.push(entry),
            None => {
                tracing::warn!(target: "docnav::search", shard = %shard, record = index, "Skipping malformed entry");
                bad += 1;
            }
        }
    }
    Ok((ShardRecord::new(key, entries), bad))
}

fn decode_json_entry(key: &str, item: &Value) -> Option<SymbolEntry> {
    let fields = item.as_array()?;
    let display = fields.first()?.as_str()?;
    let url = fields.get(1)?.as_str()?;
    if url.is_empty() {
        return None;
    }
    let scope = opt_string(fields.get(2));
    let kind = match fields.get(3) {
        None | Some(Value::Null) => None,
        Some(v) => Some(SymbolKind::parse(v.as_str()?)?),
    };
    Some(SymbolEntry::new(key, display, TargetUrl::parse(url), scope, kind))
}

fn decode_doxygen_record(shard: &ShardKey, index: usize, raw: &Value) -> Result<(ShardRecord, usize)> {
    let (raw_key, body) = as_pair(shard, index, raw)?;
    let escaped = raw_key
        .as_str()
        .ok_or_else(|| Error::malformed(shard.clone(), index, "key is not a string"))?;
    let key = record_key(shard, index, &unescape_doxygen_key(escaped))?;

    let body = body
        .as_array()
        .ok_or_else(|| Error::malformed(shard.clone(), index, "body is not an array"))?;
    let display = body
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| Error::malformed(shard.clone(), index, "missing display name"))?;

    let mut entries = Vec::with_capacity(body.len().saturating_sub(1));
    let mut bad = 0;
    for target in &body[1..] {
        let fields = target.as_array();
        let url = fields.and_then(|f| f.first()).and_then(Value::as_str);
        match url {
            Some(url) if !url.is_empty() => {
                let scope = opt_string(fields.and_then(|f| f.get(2)));
                entries.push(SymbolEntry::new(
                    key.as_str(),
                    display,
                    TargetUrl::parse(url),
                    scope,
                    None,
                ));
            }
            _ => {
                tracing::warn!(target: "docnav::search", shard = %shard, record = index, "Skipping malformed target");
                bad += 1;
            }
        }
    }
    Ok((ShardRecord::new(key, entries), bad))
}

/// Decode a generated search key
///
/// The trailing `_N` ordinal is dropped and `_xx` hex escapes are decoded:
/// `bkpsram_5fbaseaddr_12` becomes `bkpsram_baseaddr`.
pub fn unescape_doxygen_key(escaped: &str) -> String {
    let trimmed = match escaped.rfind('_') {
        Some(i) if i + 1 < escaped.len() && escaped[i + 1..].bytes().all(|b| b.is_ascii_digit()) => {
            &escaped[..i]
        }
        _ => escaped,
    };

    let bytes = trimmed.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a shard in the native JSON format
pub fn encode_json_shard(shard: &IndexShard) -> Result<Vec<u8>> {
    let records: Vec<Value> = shard
        .records()
        .iter()
        .map(|r| {
            let entries: Vec<Value> = r
                .entries
                .iter()
                .map(|e| {
                    json!([
                        e.display_name,
                        e.target_url.to_string(),
                        e.scope,
                        e.kind.as_str()
                    ])
                })
                .collect();
            json!([r.key, entries])
        })
        .collect();
    Ok(serde_json::to_vec_pretty(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b() -> ShardKey {
        ShardKey::new("b")
    }

    #[test]
    fn test_unescape_doxygen_key() {
        assert_eq!(unescape_doxygen_key("bkpsram_5fbaseaddr_12"), "bkpsram_baseaddr");
        assert_eq!(unescape_doxygen_key("button_20interrupt_17"), "button interrupt");
        assert_eq!(unescape_doxygen_key("bdcr_7"), "bdcr");
        assert_eq!(unescape_doxygen_key("priority_20levels_200–15_8"), "priority levels 0–15");
        assert_eq!(unescape_doxygen_key("plain"), "plain");
    }

    #[test]
    fn test_decode_json_shard() {
        let src = br#"[
            ["bare metal philosophy", [["Bare-Metal Philosophy", "index.html#autotoc_md12", null, "page"]]],
            ["bdcr", [["BDCR", "struct_r_c_c.html#a59", "RCC_RegDef_t"]]]
        ]"#;
        let shard = decode_shard(&b(), &ShardScheme::default(), src, ShardFormat::Json).unwrap();
        assert_eq!(shard.records().len(), 2);
        assert_eq!(shard.skipped(), 0);
        let bdcr = &shard.records()[1].entries[0];
        assert_eq!(bdcr.kind, SymbolKind::Variable);
        assert_eq!(bdcr.scope.as_deref(), Some("RCC_RegDef_t"));
    }

    #[test]
    fn test_decode_json_skips_malformed_records() {
        let src = br#"[
            ["bdcr", [["BDCR", "struct_r.html#a"]]],
            42,
            ["", [["Empty", "x.html"]]],
            ["bsrr", [["BSRR"], ["BSRR", "struct_g.html#af"]]],
            ["apb1", [["APB1", "a.html"]]]
        ]"#;
        let shard = decode_shard(&b(), &ShardScheme::default(), src, ShardFormat::Json).unwrap();
        // 42 and "" are bad records, ["BSRR"] is a bad entry, "apb1" is in the wrong shard
        assert_eq!(shard.skipped(), 4);
        assert_eq!(shard.entry_count(), 2);
    }

    #[test]
    fn test_decode_unreadable_shard_fails() {
        let err = decode_shard(&b(), &ShardScheme::default(), b"{not json", ShardFormat::Json).unwrap_err();
        assert!(matches!(err, Error::ShardLoad { .. }));

        let err = decode_shard(&b(), &ShardScheme::default(), b"{}", ShardFormat::Json).unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn test_decode_doxygen_shard() {
        let src = br#"var searchData=
[
  ['bare_20metal_20philosophy_1',['Bare-Metal Philosophy',['../index.html#autotoc_md12',1,'']]],
  ['bkpsram_5fbaseaddr_12',['BKPSRAM_BASEADDR',['../group___a_h_b1.html#ga7cfb',1,'BKPSRAM_BASEADDR:&#160;stm32f407xx.h'],['../group___a_h_b1.html#ga7cfb',1,'BKPSRAM_BASEADDR:&#160;stm32f407xx.h']]]
];
"#;
        let shard = decode_shard(&b(), &ShardScheme::default(), src, ShardFormat::Doxygen).unwrap();
        assert_eq!(shard.records().len(), 2);
        assert_eq!(shard.records()[0].key, "bare metal philosophy");
        assert_eq!(shard.records()[0].entries[0].scope, None);
        assert_eq!(shard.records()[1].key, "bkpsram baseaddr");
        assert_eq!(shard.records()[1].entries.len(), 2);
        assert_eq!(shard.records()[1].entries[0].kind, SymbolKind::Macro);
    }

    #[test]
    fn test_json_encode_then_decode_preserves_kind() {
        let entry = SymbolEntry::new(
            "gpio init",
            "GPIO_Init",
            TargetUrl::parse("group___g_p_i_o.html#ga3a"),
            Some("stm32f407xx_gpio.h".into()),
            Some(SymbolKind::Function),
        );
        let shard = IndexShard::new(
            ShardKey::new("g"),
            vec![ShardRecord::new("gpio init", vec![entry.clone()])],
        );
        let bytes = encode_json_shard(&shard).unwrap();
        let back = decode_shard(&ShardKey::new("g"), &ShardScheme::default(), &bytes, ShardFormat::Json).unwrap();
        assert_eq!(back.records()[0].entries[0], entry);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ShardFormat::parse("JSON"), Some(ShardFormat::Json));
        assert_eq!(ShardFormat::parse("doxygen"), Some(ShardFormat::Doxygen));
        assert_eq!(ShardFormat::parse("xml"), None);
    }
}
