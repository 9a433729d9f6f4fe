//! Shard keys and the partitioning scheme
//!
//! The offline generator and the runtime loader must agree on which shard a
//! key lives in. That agreement is captured by [`ShardScheme`]: a version
//! number plus the number of leading characters that name a shard.
//!
//! ## Partitioning
//!
//! - Spaces are removed from the normalized key ("compacted")
//! - The first `granularity` characters of the compacted key are the shard key
//! - A key shorter than `granularity` is its own shard key
//!
//! The mapping is a pure function of the key, so it is stable across rebuilds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the partitioning convention understood by this runtime
pub const SCHEME_VERSION: u32 = 1;

/// Largest supported shard key length
pub const MAX_GRANULARITY: usize = 2;

/// Identifier of one index shard
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardKey(String);

impl ShardKey {
    /// Wrap an already computed shard key
    pub fn new(key: impl Into<String>) -> Self {
        ShardKey(key.into())
    }

    /// Borrow the key text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this shard could hold keys starting with `compacted_prefix`
    pub fn covers(&self, compacted_prefix: &str, granularity: usize) -> bool {
        let wanted: String = compacted_prefix.chars().take(granularity).collect();
        if wanted.chars().count() >= granularity {
            self.0 == wanted
        } else {
            self.0.starts_with(&wanted)
        }
    }

    /// Encode the key for use inside a file name
    ///
    /// ASCII alphanumerics are kept, every other byte becomes `_xx`
    /// (lowercase hex).
    pub fn file_stem(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        for b in self.0.bytes() {
            if b.is_ascii_alphanumeric() {
                out.push(b as char);
            } else {
                out.push_str(&format!("_{:02x}", b));
            }
        }
        out
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardKey {
    fn from(s: &str) -> Self {
        ShardKey::new(s)
    }
}

/// Remove spaces from a normalized key
pub fn compact(key: &str) -> String {
    key.chars().filter(|c| *c != ' ').collect()
}

/// Versioned partitioning convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardScheme {
    /// Convention version
    pub version: u32,
    /// Number of leading characters naming a shard
    pub granularity: usize,
}

impl Default for ShardScheme {
    fn default() -> Self {
        ShardScheme {
            version: SCHEME_VERSION,
            granularity: 1,
        }
    }
}

impl ShardScheme {
    /// Create a scheme with the given granularity
    ///
    /// Returns `None` for a granularity outside `1..=MAX_GRANULARITY`.
    pub fn with_granularity(granularity: usize) -> Option<Self> {
        if (1..=MAX_GRANULARITY).contains(&granularity) {
            Some(ShardScheme {
                version: SCHEME_VERSION,
                granularity,
            })
        } else {
            None
        }
    }

    /// Whether this runtime can read shards produced under this scheme
    pub fn is_supported(&self) -> bool {
        self.version == SCHEME_VERSION && (1..=MAX_GRANULARITY).contains(&self.granularity)
    }

    /// Shard holding a normalized key
    pub fn shard_key(&self, normalized_key: &str) -> ShardKey {
        ShardKey(compact(normalized_key).chars().take(self.granularity).collect())
    }

    /// Catalogued shards that may contain a key starting with `normalized_prefix`
    ///
    /// With a prefix at least `granularity` characters long this is at most
    /// one shard. A shorter prefix selects every shard sharing its leading
    /// characters. The returned keys keep catalog order.
    pub fn candidate_shards<'a, I>(&self, normalized_prefix: &str, catalog: I) -> Vec<ShardKey>
    where
        I: IntoIterator<Item = &'a ShardKey>,
    {
        let compacted = compact(normalized_prefix);
        if compacted.is_empty() {
            return Vec::new();
        }
        catalog
            .into_iter()
            .filter(|k| k.covers(&compacted, self.granularity))
            .cloned()
            .collect()
    }
}
