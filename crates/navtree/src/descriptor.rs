//! Navigation descriptors
//!
//! A descriptor is the generator's description of the table of contents:
//! an ordered, nested list of `(label, url?, children)`. Two encodings are
//! read:
//! - JSON: `[{"label": .., "url": .., "children": [..] | "chunk"}]`
//! - Generated scripts: `var NAVTREE = [[label, url|null, children|null|"chunk"]]`
//!
//! A string in place of the children list names a chunk stored in a separate
//! file; chunks are resolved while building the tree, see [`ChunkResolver`].

use docnav_core::{jsdata, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Variable holding the root descriptors in generated navigation scripts
pub const DOXYGEN_NAVTREE_VAR: &str = "NAVTREE";

/// Encoding of descriptor files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescriptorFormat {
    /// Nested JSON objects
    #[default]
    Json,
    /// Generated `NAVTREE` scripts
    Doxygen,
}

/// Children of a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavChildren {
    /// Children listed in place
    Inline(Vec<NavDescriptor>),
    /// Children stored in a separately loaded chunk
    Deferred(String),
}

/// One table-of-contents entry as written by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavDescriptor {
    /// Text shown in the tree
    pub label: String,
    /// Target location; absent for pure grouping nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Nested entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<NavChildren>,
}

impl NavDescriptor {
    /// A leaf entry
    pub fn leaf(label: impl Into<String>, url: Option<&str>) -> Self {
        NavDescriptor {
            label: label.into(),
            url: url.map(str::to_string),
            children: None,
        }
    }

    /// An entry with inline children
    pub fn branch(label: impl Into<String>, url: Option<&str>, children: Vec<NavDescriptor>) -> Self {
        NavDescriptor {
            label: label.into(),
            url: url.map(str::to_string),
            children: Some(NavChildren::Inline(children)),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a descriptor file
pub fn parse_descriptors(bytes: &[u8], format: DescriptorFormat) -> Result<Vec<NavDescriptor>> {
    match format {
        DescriptorFormat::Json => parse_json(bytes),
        DescriptorFormat::Doxygen => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| Error::navigation(format!("not UTF-8: {}", e)))?;
            parse_doxygen(text, DOXYGEN_NAVTREE_VAR)
        }
    }
}

/// Decode a JSON descriptor list
pub fn parse_json(bytes: &[u8]) -> Result<Vec<NavDescriptor>> {
    serde_json::from_slice(bytes).map_err(|e| Error::navigation(e.to_string()))
}

/// Decode the descriptor list assigned to `var_name` in a generated script
pub fn parse_doxygen(src: &str, var_name: &str) -> Result<Vec<NavDescriptor>> {
    let root = jsdata::read_var(src, var_name).map_err(|e| Error::navigation(e.to_string()))?;
    doxygen_list(&root, var_name)
}

fn doxygen_list(value: &Value, path: &str) -> Result<Vec<NavDescriptor>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::navigation(format!("{}: expected a list", path)))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| doxygen_node(item, &format!("{}[{}]", path, i)))
        .collect()
}

fn doxygen_node(value: &Value, path: &str) -> Result<NavDescriptor> {
    let fields = match value.as_array().map(Vec::as_slice) {
        Some([label, url, rest @ ..]) if rest.len() <= 1 => (label, url, rest.first()),
        _ => {
            return Err(Error::navigation(format!(
                "{}: expected [label, url, children]",
                path
            )))
        }
    };
    let (label, url, children) = fields;

    let label = label
        .as_str()
        .ok_or_else(|| Error::navigation(format!("{}: label is not a string", path)))?;
    let url = match url {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        _ => return Err(Error::navigation(format!("{}: url is not a string", path))),
    };
    let children = match children {
        None | Some(Value::Null) => None,
        Some(Value::String(chunk)) => Some(NavChildren::Deferred(chunk.clone())),
        Some(list @ Value::Array(_)) => Some(NavChildren::Inline(doxygen_list(list, path)?)),
        Some(_) => return Err(Error::navigation(format!("{}: bad children", path))),
    };

    Ok(NavDescriptor {
        label: label.to_string(),
        url,
        children,
    })
}

// ============================================================================
// Flat descriptors
// ============================================================================

/// One entry of a flat, depth-annotated descriptor list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatNavEntry {
    /// Text shown in the tree
    pub label: String,
    /// Target location
    #[serde(default)]
    pub url: Option<String>,
    /// Nesting depth; top-level entries are 0
    pub depth: usize,
}

impl FlatNavEntry {
    /// Create a flat entry
    pub fn new(label: impl Into<String>, url: Option<&str>, depth: usize) -> Self {
        FlatNavEntry {
            label: label.into(),
            url: url.map(str::to_string),
            depth,
        }
    }
}

/// Nest a flat list by depth
///
/// Each entry becomes a child of the closest preceding entry one level
/// shallower. The first entry must be at depth 0 and depth may only grow by
/// one from an entry to the next.
pub fn nest_flat(entries: &[FlatNavEntry]) -> Result<Vec<NavDescriptor>> {
    let mut roots = Vec::new();
    // open[d] is the latest entry at depth d still taking children
    let mut open: Vec<NavDescriptor> = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        if entry.depth > open.len() {
            return Err(Error::navigation(format!(
                "entry {} ('{}') jumps from depth {} to {}",
                i,
                entry.label,
                open.len() as i64 - 1,
                entry.depth
            )));
        }
        while open.len() > entry.depth {
            close_entry(&mut open, &mut roots);
        }
        open.push(NavDescriptor::leaf(entry.label.clone(), entry.url.as_deref()));
    }

    while !open.is_empty() {
        close_entry(&mut open, &mut roots);
    }
    Ok(roots)
}

/// Pop the deepest open entry and attach it to its parent
fn close_entry(open: &mut Vec<NavDescriptor>, roots: &mut Vec<NavDescriptor>) {
    let Some(done) = open.pop() else { return };
    match open.last_mut() {
        Some(parent) => match &mut parent.children {
            Some(NavChildren::Inline(children)) => children.push(done),
            _ => parent.children = Some(NavChildren::Inline(vec![done])),
        },
        None => roots.push(done),
    }
}

// ============================================================================
// Chunks
// ============================================================================

/// Supplies the children of deferred chunks
pub trait ChunkResolver {
    /// Children stored under `chunk`
    fn resolve(&self, chunk: &str) -> Result<Vec<NavDescriptor>>;
}

/// Resolver for trees without deferred chunks; every lookup fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChunks;

impl ChunkResolver for NoChunks {
    fn resolve(&self, chunk: &str) -> Result<Vec<NavDescriptor>> {
        Err(Error::navigation(format!("no resolver for chunk '{}'", chunk)))
    }
}

impl ChunkResolver for HashMap<String, Vec<NavDescriptor>> {
    fn resolve(&self, chunk: &str) -> Result<Vec<NavDescriptor>> {
        self.get(chunk)
            .cloned()
            .ok_or_else(|| Error::navigation(format!("unknown chunk '{}'", chunk)))
    }
}

/// Chunks stored as files next to the root descriptor
///
/// JSON chunks live in `<chunk>.json`; generated chunks live in `<chunk>.js`
/// and assign a variable named after the chunk.
#[derive(Debug, Clone)]
pub struct DirChunkResolver {
    dir: PathBuf,
    format: DescriptorFormat,
}

impl DirChunkResolver {
    /// Resolve chunks from files in `dir`
    pub fn new(dir: impl Into<PathBuf>, format: DescriptorFormat) -> Self {
        DirChunkResolver {
            dir: dir.into(),
            format,
        }
    }

    /// Directory chunks are read from
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ChunkResolver for DirChunkResolver {
    fn resolve(&self, chunk: &str) -> Result<Vec<NavDescriptor>> {
        if chunk.is_empty() || !chunk.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(Error::navigation(format!("invalid chunk name '{}'", chunk)));
        }
        match self.format {
            DescriptorFormat::Json => {
                let bytes = std::fs::read(self.dir.join(format!("{}.json", chunk)))?;
                parse_json(&bytes)
            }
            DescriptorFormat::Doxygen => {
                let text = std::fs::read_to_string(self.dir.join(format!("{}.js", chunk)))?;
                parse_doxygen(&text, chunk)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_nested() {
        let json = br#"[
            {"label": "Overview", "url": "index.html", "children": [
                {"label": "Table of Contents", "url": "index.html#autotoc_md2"},
                {"label": "Topics", "url": "topics.html", "children": "topics"}
            ]},
            {"label": "Files"}
        ]"#;
        let descriptors = parse_json(json).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[1].url, None);
        match &descriptors[0].children {
            Some(NavChildren::Inline(children)) => {
                assert_eq!(children[0].label, "Table of Contents");
                assert_eq!(
                    children[1].children,
                    Some(NavChildren::Deferred("topics".into()))
                );
            }
            other => panic!("unexpected children {:?}", other),
        }
    }

    #[test]
    fn test_parse_json_rejects_missing_label() {
        let err = parse_json(br#"[{"url": "index.html"}]"#).unwrap_err();
        assert!(matches!(err, Error::NavigationDescriptor(_)));
    }

    #[test]
    fn test_parse_doxygen_navtree() {
        let src = r#"
var NAVTREE =
[
  [ "STM32F407 Bare-Metal Driver Development", "index.html", [
    [ "Table of Contents", "index.html#autotoc_md2", null ],
    [ "Topics", "topics.html", "topics" ],
    [ "Files", null, [
      [ "File List", "files.html", "files_dup" ]
    ] ]
  ] ]
];

var NAVTREEINDEX =
[
"000___hello___world_2_src_2main_8c.html"
];

var SYNCONMSG = 'click to disable panel synchronization';
"#;
        let descriptors = parse_doxygen(src, DOXYGEN_NAVTREE_VAR).unwrap();
        assert_eq!(descriptors.len(), 1);
        let Some(NavChildren::Inline(children)) = &descriptors[0].children else {
            panic!("root must have inline children");
        };
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].children, None);
        assert_eq!(children[1].children, Some(NavChildren::Deferred("topics".into())));
        assert_eq!(children[2].url, None);
    }

    #[test]
    fn test_parse_doxygen_rejects_bad_node() {
        let err = parse_doxygen("var NAVTREE = [[ 1, null, null ]];", "NAVTREE").unwrap_err();
        assert!(err.to_string().contains("label"));
        assert!(parse_doxygen("var OTHER = [];", "NAVTREE").is_err());
    }

    #[test]
    fn test_nest_flat() {
        let flat = vec![
            FlatNavEntry::new("A", Some("a.html"), 0),
            FlatNavEntry::new("A1", Some("a.html#1"), 1),
            FlatNavEntry::new("A1x", None, 2),
            FlatNavEntry::new("A2", Some("a.html#2"), 1),
            FlatNavEntry::new("B", Some("b.html"), 0),
        ];
        let nested = nest_flat(&flat).unwrap();
        assert_eq!(nested.len(), 2);
        let Some(NavChildren::Inline(a)) = &nested[0].children else {
            panic!("A must have children");
        };
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].label, "A1");
        assert!(matches!(&a[0].children, Some(NavChildren::Inline(c)) if c[0].label == "A1x"));
        assert_eq!(a[1].children, None);
        assert_eq!(nested[1].children, None);
    }

    #[test]
    fn test_nest_flat_rejects_depth_jump() {
        let flat = vec![
            FlatNavEntry::new("A", None, 0),
            FlatNavEntry::new("A11", None, 2),
        ];
        assert!(matches!(nest_flat(&flat), Err(Error::NavigationDescriptor(_))));
        assert!(nest_flat(&[FlatNavEntry::new("X", None, 1)]).is_err());
    }

    #[test]
    fn test_dir_chunk_resolver() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("topics.js"),
            "var topics =\n[\n    [ \"GPIO\", \"group___g_p_i_o.html\", null ]\n];\n",
        )
        .unwrap();
        let resolver = DirChunkResolver::new(tmp.path(), DescriptorFormat::Doxygen);
        let children = resolver.resolve("topics").unwrap();
        assert_eq!(children[0].label, "GPIO");
        assert!(resolver.resolve("missing").is_err());
        assert!(resolver.resolve("../escape").is_err());
    }
}
