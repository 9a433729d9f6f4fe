//! Index shards
//!
//! An [`IndexShard`] is one partition of the symbol corpus: an ordered list
//! of records, each a normalized key with the entries filed under it. Shards
//! are immutable after decoding and shared behind `Arc` between the store
//! cache and the symbol index.

use docnav_core::{ShardKey, SymbolEntry};

/// Entries filed under one normalized key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardRecord {
    /// Normalized key
    pub key: String,
    /// Entries in generation order
    pub entries: Vec<SymbolEntry>,
}

impl ShardRecord {
    /// Create a record
    pub fn new(key: impl Into<String>, entries: Vec<SymbolEntry>) -> Self {
        ShardRecord {
            key: key.into(),
            entries,
        }
    }
}

/// One partition of the symbol corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexShard {
    key: ShardKey,
    records: Vec<ShardRecord>,
    skipped: usize,
}

impl IndexShard {
    /// Create a shard from already validated records
    pub fn new(key: ShardKey, records: Vec<ShardRecord>) -> Self {
        IndexShard {
            key,
            records,
            skipped: 0,
        }
    }

    /// Record how many malformed records were dropped while decoding
    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }

    /// Shard key
    pub fn key(&self) -> &ShardKey {
        &self.key
    }

    /// Records in generation order
    pub fn records(&self) -> &[ShardRecord] {
        &self.records
    }

    /// Number of malformed records dropped while decoding
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Total number of entries across all records
    pub fn entry_count(&self) -> usize {
        self.records.iter().map(|r| r.entries.len()).sum()
    }

    /// Iterate entries in generation order
    pub fn entries(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.records.iter().flat_map(|r| r.entries.iter())
    }

    /// Whether the shard holds no entries
    pub fn is_empty(&self) -> bool {
        self.records.iter().all(|r| r.entries.is_empty())
    }
}
