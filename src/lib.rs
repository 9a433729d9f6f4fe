//! docnav - navigation tree and incremental symbol search for generated
//! API reference sites
//!
//! Browsing and searching a static documentation corpus entirely on the
//! client: a collapsible table of contents plus prefix search over a symbol
//! index that is split into shards and loaded on demand.
//!
//! # Quick Start
//!
//! ```ignore
//! use docnav::SearchSession;
//! use std::path::Path;
//!
//! let mut session = SearchSession::open_dir(Path::new("docs/html"))?;
//! let results = session.set_query("button int");
//! ```
//!
//! # Architecture
//!
//! - `docnav-core`: normalization, shard keys, symbol entries, errors
//! - `docnav-search`: shard store, symbol index, query matcher, shard writer
//! - `docnav-navtree`: descriptors, navigation tree, selection coordinator
//! - `docnav-session`: configuration and the session facade
//!
//! The session facade is re-exported at the top level; the component crates
//! are available as modules for callers that drive them directly.

pub use docnav_session::*;

pub use docnav_core as core;
pub use docnav_navtree as navtree;
pub use docnav_search as search;
