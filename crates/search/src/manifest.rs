//! Shard manifest
//!
//! The manifest (`manifest.json`) is the catalog shared by the generator and
//! the runtime:
//! - Manifest format version
//! - Partitioning scheme (convention version + granularity)
//! - One entry per shard: key, file name, entry count
//!
//! Written atomically via temp + rename.

use docnav_core::{Error, Result, ShardKey, ShardScheme};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

/// Current manifest version
pub const MANIFEST_VERSION: u32 = 1;

/// Default manifest file name
pub const MANIFEST_FILE: &str = "manifest.json";

/// Catalog entry for a single shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Shard key
    pub key: ShardKey,
    /// File holding the shard, relative to the index directory
    pub file: String,
    /// Number of entries in the shard
    #[serde(default)]
    pub entries: usize,
}

/// Catalog of every shard in an index directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardManifest {
    /// Format version
    pub version: u32,
    /// Partitioning convention the shards were written with
    pub scheme: ShardScheme,
    /// Shards, in key order
    pub shards: Vec<ManifestEntry>,
}

impl ShardManifest {
    /// Create an empty manifest for a scheme
    pub fn new(scheme: ShardScheme) -> Self {
        ShardManifest {
            version: MANIFEST_VERSION,
            scheme,
            shards: Vec::new(),
        }
    }

    /// Parse and validate manifest bytes
    ///
    /// # Errors
    ///
    /// Returns a `ShardLoad` error (for the empty shard key) when the bytes are
    /// not a manifest, the version or scheme is not supported, or a shard key
    /// is listed twice.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let manifest: ShardManifest = serde_json::from_slice(bytes)
            .map_err(|e| Error::shard_load(ShardKey::new(""), format!("manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check version, scheme and key uniqueness
    pub fn validate(&self) -> Result<()> {
        if self.version != MANIFEST_VERSION {
            return Err(Error::shard_load(
                ShardKey::new(""),
                format!("unsupported manifest version {}", self.version),
            ));
        }
        if !self.scheme.is_supported() {
            return Err(Error::shard_load(
                ShardKey::new(""),
                format!(
                    "unsupported shard scheme v{} with granularity {}",
                    self.scheme.version, self.scheme.granularity
                ),
            ));
        }
        let mut seen = HashSet::new();
        for entry in &self.shards {
            if !seen.insert(&entry.key) {
                return Err(Error::shard_load(
                    entry.key.clone(),
                    "listed twice in manifest",
                ));
            }
        }
        Ok(())
    }

    /// Shard keys in catalog order
    pub fn keys(&self) -> impl Iterator<Item = &ShardKey> {
        self.shards.iter().map(|e| &e.key)
    }

    /// Catalog entry for a shard
    pub fn entry(&self, key: &ShardKey) -> Option<&ManifestEntry> {
        self.shards.iter().find(|e| &e.key == key)
    }

    /// Shards that may hold keys starting with `normalized_prefix`
    pub fn candidate_shards(&self, normalized_prefix: &str) -> Vec<ShardKey> {
        self.scheme.candidate_shards(normalized_prefix, self.keys())
    }

    /// Total number of entries across all shards
    pub fn total_entries(&self) -> usize {
        self.shards.iter().map(|e| e.entries).sum()
    }
}

/// Write a manifest to a file atomically (temp + rename)
pub fn write_manifest(path: &Path, manifest: &ShardManifest) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let payload = serde_json::to_vec_pretty(manifest)?;

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&payload)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load and validate a manifest file
pub fn load_manifest(path: &Path) -> Result<ShardManifest> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::shard_load(
            ShardKey::new(""),
            format!("manifest '{}': {}", path.display(), e),
        )
    })?;
    ShardManifest::parse(&bytes)
}

// ============================================================================
// Tests
// ============================================================================
