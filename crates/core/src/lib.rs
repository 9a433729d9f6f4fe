//! Core types for docnav
//!
//! This crate defines the vocabulary shared by the search and navigation
//! crates:
//! - Error: the error taxonomy and `Result` alias
//! - normalize: key normalization and tokenization
//! - SymbolEntry / SymbolKind / TargetUrl: documented items
//! - ShardKey / ShardScheme: the partitioning convention
//! - jsdata: reader for generated script data files

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;
pub mod jsdata;
pub mod normalize;
pub mod shard_key;

pub use entry::{plain_text, EntryIdentity, SymbolEntry, SymbolKind, TargetUrl};
pub use error::{Error, Result};
pub use normalize::normalize;
pub use shard_key::{ShardKey, ShardScheme, SCHEME_VERSION};
