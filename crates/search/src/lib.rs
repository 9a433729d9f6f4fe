//! Incremental symbol search over sharded indexes
//!
//! This crate provides:
//! - Shard codecs for the native JSON and generated script encodings
//! - The shard manifest and its atomic writer
//! - ShardStore: memoized, coalescing shard loading
//! - SymbolIndex: merged shards with tiered prefix lookup
//! - QueryMatcher: sequence-numbered queries that discard stale completions
//! - ShardWriter: the generator side, partitioning labelled items into shards
//!
//! # Usage
//!
//! ```ignore
//! use docnav_search::{DirSource, QueryMatcher, ShardStore};
//! use std::sync::Arc;
//!
//! let store = ShardStore::new(Arc::new(DirSource::new("docs/search")));
//! let mut matcher = QueryMatcher::new();
//! if let Some(results) = matcher.run("button int", &store) {
//!     for hit in &results.hits {
//!         println!("{} -> {}", hit.entry.display_name, hit.entry.target_url);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod index;
pub mod manifest;
pub mod matcher;
pub mod rank;
pub mod shard;
pub mod store;
pub mod writer;

// Re-export commonly used types
pub use codec::{decode_shard, encode_json_shard, ShardFormat};
pub use index::SymbolIndex;
pub use manifest::{load_manifest, write_manifest, ManifestEntry, ShardManifest, MANIFEST_FILE};
pub use matcher::{
    Completion, MatchOptions, MatcherState, QueryMatcher, QueryState, ResultSet, Submission,
    Ticket,
};
pub use rank::{Hit, MatchTier, ResultGroup};
pub use shard::{IndexShard, ShardRecord};
pub use store::{DirSource, MemorySource, ShardLoad, ShardSource, ShardStore, StoreStats};
pub use writer::{LabelledItem, ShardWriter};
