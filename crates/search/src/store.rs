//! IndexShard store
//!
//! Owns raw shard data and serves decoded shards on demand:
//! - [`ShardSource`] abstracts where shard files come from
//! - [`ShardStore`] memoizes decoded shards per key, no eviction
//!
//! # Thread Safety
//!
//! The store is `Send + Sync`. Each shard key owns a `OnceCell`, so concurrent
//! requests for the same shard coalesce into one fetch and every caller sees
//! the same `Arc<IndexShard>`. A failed fetch leaves the cell empty and a
//! later request tries again.

use crate::codec::{decode_shard, ShardFormat};
use crate::manifest::{ShardManifest, MANIFEST_FILE};
use crate::shard::IndexShard;
use dashmap::DashMap;
use docnav_core::{Error, Result, ShardKey};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// ShardSource
// ============================================================================

/// Where shard and manifest files are read from
pub trait ShardSource: Send + Sync {
    /// Read a file by its catalog name
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Files under a directory on disk
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Serve files from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource { root: root.into() }
    }

    /// Directory being served
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ShardSource for DirSource {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let rel = Path::new(name);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::shard_load(
                ShardKey::new(""),
                format!("refusing to read '{}' outside the index directory", name),
            ));
        }
        Ok(std::fs::read(self.root.join(rel))?)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Files held in memory
///
/// Files can be added or removed while the store is live, which lets tests
/// simulate a missing or corrupt resource.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, Vec<u8>>>,
    reads: AtomicU64,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.write().insert(name.into(), bytes.into());
    }

    /// Remove a file, returning whether it existed
    pub fn remove(&self, name: &str) -> bool {
        self.files.write().remove(name).is_some()
    }

    /// Number of reads served so far, including failed ones
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Acquire)
    }
}

impl ShardSource for MemorySource {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::AcqRel);
        self.files.read().get(name).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no file '{}'", name),
            ))
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// ShardStore
// ============================================================================

/// Outcome of loading one shard for a query
#[derive(Debug)]
pub struct ShardLoad {
    /// Shard that was requested
    pub shard: ShardKey,
    /// Decoded shard, or why it could not be loaded
    pub result: Result<Arc<IndexShard>>,
}

/// Counters describing store activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Shard fetches that reached the source
    pub fetches: u64,
    /// Requests answered from cache
    pub cache_hits: u64,
    /// Fetches that failed
    pub failures: u64,
    /// Shards currently cached
    pub cached_shards: usize,
}

/// Memoizing loader for index shards
pub struct ShardStore {
    source: Arc<dyn ShardSource>,
    format: ShardFormat,
    manifest_name: String,
    manifest: OnceCell<Arc<ShardManifest>>,
    cache: DashMap<ShardKey, Arc<OnceCell<Arc<IndexShard>>>>,
    fetches: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
}

impl ShardStore {
    /// Create a store reading JSON shards and `manifest.json` from `source`
    pub fn new(source: Arc<dyn ShardSource>) -> Self {
        ShardStore {
            source,
            format: ShardFormat::Json,
            manifest_name: MANIFEST_FILE.to_string(),
            manifest: OnceCell::new(),
            cache: DashMap::new(),
            fetches: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Builder: set the shard encoding
    pub fn with_format(mut self, format: ShardFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder: set the manifest file name
    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Shard encoding in use
    pub fn format(&self) -> ShardFormat {
        self.format
    }

    // ========================================================================
    // Manifest
    // ========================================================================

    /// The shard catalog, read once on first use
    ///
    /// A failed read is not memoized.
    pub fn manifest(&self) -> Result<Arc<ShardManifest>> {
        self.manifest
            .get_or_try_init(|| {
                let bytes = self.source.read(&self.manifest_name).map_err(|e| {
                    Error::shard_load(ShardKey::new(""), format!("manifest: {}", e))
                })?;
                let manifest = ShardManifest::parse(&bytes)?;
                tracing::info!(
                    target: "docnav::store",
                    source = %self.source.describe(),
                    shards = manifest.shards.len(),
                    granularity = manifest.scheme.granularity,
                    "Shard manifest loaded"
                );
                Ok(Arc::new(manifest))
            })
            .cloned()
    }

    // ========================================================================
    // Shards
    // ========================================================================

    /// Load a shard, serving it from cache when already fetched
    ///
    /// # Errors
    ///
    /// Returns `ShardLoad` when the shard is not catalogued, the file is
    /// missing, or it cannot be decoded at all. Individually malformed
    /// records do not fail the load; see [`IndexShard::skipped`].
    pub fn load_shard(&self, key: &ShardKey) -> Result<Arc<IndexShard>> {
        let cell = self
            .cache
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        if let Some(shard) = cell.get() {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: "docnav::store", shard = %key, "Shard cache hit");
            return Ok(Arc::clone(shard));
        }

        cell.get_or_try_init(|| self.fetch(key))
            .cloned()
            .map_err(|e| {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "docnav::store", shard = %key, error = %e, "Shard load failed");
                e
            })
    }

    /// Load several shards, keeping each outcome
    pub fn load_all(&self, keys: &[ShardKey]) -> Vec<ShardLoad> {
        keys.iter()
            .map(|k| ShardLoad {
                shard: k.clone(),
                result: self.load_shard(k),
            })
            .collect()
    }

    /// Whether a shard has been fetched and decoded
    pub fn is_cached(&self, key: &ShardKey) -> bool {
        self.cache.get(key).map(|c| c.get().is_some()).unwrap_or(false)
    }

    /// Snapshot of the store counters
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            fetches: self.fetches.load(Ordering::Acquire),
            cache_hits: self.cache_hits.load(Ordering::Acquire),
            failures: self.failures.load(Ordering::Acquire),
            cached_shards: self.cache.iter().filter(|c| c.get().is_some()).count(),
        }
    }

    fn fetch(&self, key: &ShardKey) -> Result<Arc<IndexShard>> {
        let manifest = self.manifest()?;
        let entry = manifest
            .entry(key)
            .ok_or_else(|| Error::shard_load(key.clone(), "not in manifest"))?;

        self.fetches.fetch_add(1, Ordering::Relaxed);
        let bytes = self
            .source
            .read(&entry.file)
            .map_err(|e| Error::shard_load(key.clone(), e.to_string()))?;
        let shard = decode_shard(key, &manifest.scheme, &bytes, self.format)?;

        if shard.skipped() > 0 {
            tracing::warn!(
                target: "docnav::store",
                shard = %key,
                skipped = shard.skipped(),
                "Shard loaded with malformed records skipped"
            );
        }
        tracing::debug!(
            target: "docnav::store",
            shard = %key,
            entries = shard.entry_count(),
            "Shard fetched"
        );
        Ok(Arc::new(shard))
    }
}

impl std::fmt::Debug for ShardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardStore")
            .field("source", &self.source.describe())
            .field("format", &self.format)
            .field("stats", &self.stats())
            .finish()
    }
}
