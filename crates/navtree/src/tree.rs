//! Navigation tree
//!
//! Nodes live in one arena indexed by [`NodeId`]. The arena is filled in
//! pre-order, so iterating ids in order is a depth-first pre-order walk that
//! reproduces descriptor order. Index 0 is a synthetic root holding the
//! top-level descriptors; it is never reported as part of a path.
//!
//! The structure is fixed after [`NavigationTree::build_with`]; only the
//! `expanded` flags change afterwards.

use crate::descriptor::{nest_flat, ChunkResolver, FlatNavEntry, NavChildren, NavDescriptor, NoChunks};
use docnav_core::{Error, Result, TargetUrl};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Position of a node in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Id for an arena index, as handed out by [`NavigationTree::preorder`]
    pub fn from_index(index: usize) -> Self {
        NodeId(index)
    }

    /// Arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// One table-of-contents node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNode {
    /// Text shown in the tree
    pub label: String,
    /// Target location; `None` for grouping nodes
    pub target_url: Option<TargetUrl>,
    /// Children in descriptor order
    pub children: Vec<NodeId>,
    /// Owning node; `None` only for the synthetic root
    pub parent: Option<NodeId>,
    /// Whether the children are shown
    pub expanded: bool,
    /// Distance from the synthetic root; top-level nodes are 1
    pub depth: usize,
}

impl NavNode {
    /// Whether the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Collapsible table of contents
#[derive(Debug, Clone)]
pub struct NavigationTree {
    nodes: Vec<NavNode>,
}

impl NavigationTree {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Build from descriptors whose children are all inline
    ///
    /// Deferred chunks cannot be resolved and become leaves.
    pub fn build(descriptors: Vec<NavDescriptor>) -> Result<Self> {
        Self::build_with(descriptors, &NoChunks)
    }

    /// Build from descriptors, resolving deferred chunks through `resolver`
    ///
    /// # Errors
    ///
    /// `NavigationDescriptor` when there are no descriptors at all. A chunk
    /// that cannot be resolved (or refers back to itself) leaves its node
    /// childless and is only logged.
    pub fn build_with(descriptors: Vec<NavDescriptor>, resolver: &dyn ChunkResolver) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(Error::navigation("descriptor list is empty"));
        }

        let mut tree = NavigationTree {
            nodes: vec![NavNode {
                label: String::new(),
                target_url: None,
                children: Vec::new(),
                parent: None,
                expanded: true,
                depth: 0,
            }],
        };
        let mut active_chunks = HashSet::new();
        tree.attach(NodeId(0), descriptors, resolver, &mut active_chunks);

        tracing::info!(target: "docnav::navtree", nodes = tree.len(), "Navigation tree built");
        Ok(tree)
    }

    /// Build from a flat, depth-annotated list
    pub fn from_flat(entries: &[FlatNavEntry]) -> Result<Self> {
        Self::build(nest_flat(entries)?)
    }

    fn attach(
        &mut self,
        parent: NodeId,
        descriptors: Vec<NavDescriptor>,
        resolver: &dyn ChunkResolver,
        active_chunks: &mut HashSet<String>,
    ) {
        let depth = self.nodes[parent.0].depth + 1;
        for descriptor in descriptors {
            let id = NodeId(self.nodes.len());
            self.nodes.push(NavNode {
                label: descriptor.label,
                target_url: descriptor.url.as_deref().map(TargetUrl::parse),
                children: Vec::new(),
                parent: Some(parent),
                expanded: false,
                depth,
            });
            self.nodes[parent.0].children.push(id);

            match descriptor.children {
                None => {}
                Some(NavChildren::Inline(children)) => {
                    self.attach(id, children, resolver, active_chunks);
                }
                Some(NavChildren::Deferred(chunk)) => {
                    if !active_chunks.insert(chunk.clone()) {
                        tracing::warn!(target: "docnav::navtree", chunk = %chunk, "Chunk refers to itself, left empty");
                        continue;
                    }
                    match resolver.resolve(&chunk) {
                        Ok(children) => self.attach(id, children, resolver, active_chunks),
                        Err(e) => {
                            tracing::warn!(target: "docnav::navtree", chunk = %chunk, error = %e, "Chunk unavailable, node left empty")
                        }
                    }
                    active_chunks.remove(&chunk);
                }
            }
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// The synthetic root
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// A node by id
    pub fn node(&self, id: NodeId) -> Option<&NavNode> {
        self.nodes.get(id.0)
    }

    /// Top-level nodes
    pub fn top_level(&self) -> &[NodeId] {
        &self.nodes[0].children
    }

    /// Number of nodes, excluding the synthetic root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the tree has no nodes besides the synthetic root
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every node except the synthetic root, depth-first pre-order
    pub fn preorder(&self) -> impl Iterator<Item = (NodeId, &NavNode)> {
        self.nodes.iter().enumerate().skip(1).map(|(i, n)| (NodeId(i), n))
    }

    /// Nodes currently shown: top-level nodes plus children of expanded nodes
    pub fn visible(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.top_level().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            let node = &self.nodes[id.0];
            if node.expanded {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // ========================================================================
    // Expansion
    // ========================================================================

    /// Flip `expanded` on one node; descendants keep their state
    ///
    /// Returns the new state, or `None` for an unknown id or the root.
    pub fn toggle(&mut self, id: NodeId) -> Option<bool> {
        if id.0 == 0 {
            return None;
        }
        let node = self.nodes.get_mut(id.0)?;
        node.expanded = !node.expanded;
        Some(node.expanded)
    }

    /// Expand every node
    pub fn expand_all(&mut self) {
        for node in self.nodes.iter_mut().skip(1) {
            node.expanded = true;
        }
    }

    /// Collapse every node
    pub fn collapse_all(&mut self) {
        for node in self.nodes.iter_mut().skip(1) {
            node.expanded = false;
        }
    }

    // ========================================================================
    // Active path
    // ========================================================================

    /// Path from a top-level node down to the node for `current_url`
    ///
    /// The first node in pre-order whose target matches the location exactly
    /// wins. When no node matches exactly, the first node on the same page
    /// is used. Empty when nothing matches.
    pub fn active_path(&self, current_url: &str) -> Vec<NodeId> {
        let current = TargetUrl::parse(current_url);
        let found = self
            .find(|t| t.same_location(&current))
            .or_else(|| self.find(|t| t.same_page(&current)));
        match found {
            Some(id) => self.path_to(id),
            None => Vec::new(),
        }
    }

    /// Expand every node on the active path except the matched node itself
    ///
    /// Returns the path.
    pub fn expand_active(&mut self, current_url: &str) -> Vec<NodeId> {
        let path = self.active_path(current_url);
        if let Some((_, ancestors)) = path.split_last() {
            for id in ancestors {
                self.nodes[id.0].expanded = true;
            }
        }
        path
    }

    fn find(&self, matches: impl Fn(&TargetUrl) -> bool) -> Option<NodeId> {
        self.preorder()
            .find(|(_, n)| n.target_url.as_ref().map(&matches).unwrap_or(false))
            .map(|(id, _)| id)
    }

    fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cursor = self.nodes[id.0].parent;
        while let Some(parent) = cursor {
            if parent.0 == 0 {
                break;
            }
            path.push(parent);
            cursor = self.nodes[parent.0].parent;
        }
        path.reverse();
        path
    }
}
