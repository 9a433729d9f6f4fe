//! Table of contents for generated documentation sites
//!
//! This crate provides:
//! - Descriptor decoding (nested JSON, generated `NAVTREE` scripts, flat
//!   depth-annotated lists) with deferred chunk resolution
//! - NavigationTree: the collapsible tree with active-path lookup
//! - SelectionCoordinator: turns a chosen hit or node into a location and
//!   forwards it to the page view when panel sync is on

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod selection;
pub mod tree;

// Re-export commonly used types
pub use descriptor::{
    nest_flat, parse_descriptors, ChunkResolver, DescriptorFormat, DirChunkResolver,
    FlatNavEntry, NavChildren, NavDescriptor, NoChunks,
};
pub use selection::{
    NavigationEvent, NavigationSink, ResolvedUrl, SelectionCoordinator, SelectionOrigin,
    SelectionTarget,
};
pub use tree::{NavNode, NavigationTree, NodeId};
