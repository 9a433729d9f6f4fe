//! In-memory symbol index
//!
//! The index is the union of the shards loaded so far, merged as they arrive.
//! Lookup is a pure function of (loaded shards, prefix):
//! - Only shards covering the prefix's leading characters are consulted, so
//!   unrelated shards loaded earlier never change a result
//! - Candidates are visited in shard-key order, then record order, then entry
//!   order, which is generation order
//! - A record key decides whether its entries match; the tier comes from
//!   the entry's own normalized label, so an entry filed under a later-word
//!   key still ranks as a token-prefix match
//! - An entry filed under several keys is reported once, at its best tier and
//!   earliest position

use crate::rank::{classify, rank, Hit, MatchTier};
use crate::shard::IndexShard;
use docnav_core::shard_key::compact;
use docnav_core::{normalize, EntryIdentity, ShardKey, ShardScheme, SymbolEntry};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mapping from normalized key to entries, built from loaded shards
#[derive(Debug, Clone)]
pub struct SymbolIndex {
    scheme: ShardScheme,
    shards: BTreeMap<ShardKey, Arc<IndexShard>>,
}

impl SymbolIndex {
    /// Create an empty index for a partitioning scheme
    pub fn new(scheme: ShardScheme) -> Self {
        SymbolIndex {
            scheme,
            shards: BTreeMap::new(),
        }
    }

    /// Partitioning scheme
    pub fn scheme(&self) -> &ShardScheme {
        &self.scheme
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// Merge a loaded shard
    ///
    /// Merging a shard that is already present is a no-op; returns whether the
    /// shard was new.
    pub fn insert_shard(&mut self, shard: Arc<IndexShard>) -> bool {
        if self.shards.contains_key(shard.key()) {
            return false;
        }
        self.shards.insert(shard.key().clone(), shard);
        true
    }

    /// Whether a shard has been merged
    pub fn contains_shard(&self, key: &ShardKey) -> bool {
        self.shards.contains_key(key)
    }

    /// A merged shard
    pub fn shard(&self, key: &ShardKey) -> Option<&Arc<IndexShard>> {
        self.shards.get(key)
    }

    /// Keys of merged shards, in order
    pub fn shard_keys(&self) -> impl Iterator<Item = &ShardKey> {
        self.shards.keys()
    }

    /// Number of entries across merged shards
    pub fn entry_count(&self) -> usize {
        self.shards.values().map(|s| s.entry_count()).sum()
    }

    /// Entries filed exactly under `normalized_key`, in generation order
    pub fn get(&self, normalized_key: &str) -> Vec<&SymbolEntry> {
        let owner = self.scheme.shard_key(normalized_key);
        self.shards
            .get(&owner)
            .into_iter()
            .flat_map(|s| s.records())
            .filter(|r| r.key == normalized_key)
            .flat_map(|r| r.entries.iter())
            .collect()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Ranked entries matching a normalized prefix
    pub fn lookup(&self, normalized_prefix: &str) -> Vec<Hit> {
        let compacted = compact(normalized_prefix);
        let covering: Vec<&ShardKey> = self
            .shards
            .keys()
            .filter(|k| k.covers(&compacted, self.scheme.granularity))
            .collect();
        self.lookup_in(normalized_prefix, covering)
    }

    /// Ranked entries matching a normalized prefix, restricted to some shards
    ///
    /// Shards that are not merged are ignored.
    pub fn lookup_in<'a, I>(&self, normalized_prefix: &str, shards: I) -> Vec<Hit>
    where
        I: IntoIterator<Item = &'a ShardKey>,
    {
        if normalized_prefix.is_empty() {
            return Vec::new();
        }

        let mut wanted: Vec<&ShardKey> = shards.into_iter().collect();
        wanted.sort();
        wanted.dedup();

        let mut best: FxHashMap<EntryIdentity<'_>, usize> = FxHashMap::default();
        let mut hits: Vec<(MatchTier, usize, &SymbolEntry)> = Vec::new();
        let mut position = 0;

        for shard in wanted.into_iter().filter_map(|k| self.shards.get(k)) {
            for record in shard.records() {
                let filed = classify(&record.key, normalized_prefix);
                for entry in &record.entries {
                    let here = position;
                    position += 1;
                    let Some(filed) = filed else { continue };
                    let tier = label_tier(entry, normalized_prefix).unwrap_or(filed);
                    match best.entry(entry.identity()) {
                        Entry::Occupied(slot) => {
                            let existing = &mut hits[*slot.get()];
                            if tier < existing.0 {
                                existing.0 = tier;
                            }
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(hits.len());
                            hits.push((tier, here, entry));
                        }
                    }
                }
            }
        }

        let mut ranked: Vec<Hit> = hits
            .into_iter()
            .map(|(tier, position, entry)| Hit {
                entry: entry.clone(),
                tier,
                position,
            })
            .collect();
        rank(&mut ranked);
        ranked
    }
}

/// Tier of a prefix against the entry's full label
///
/// `None` when the label normalizes to something the prefix does not reach,
/// in which case the record key's tier stands.
fn label_tier(entry: &SymbolEntry, normalized_prefix: &str) -> Option<MatchTier> {
    classify(&normalize(&entry.plain_label()), normalized_prefix)
}

// ============================================================================
// Tests
// ============================================================================
