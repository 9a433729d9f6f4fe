//! Selection coordination
//!
//! Resolves a chosen search hit or tree node to a document location and,
//! when panel sync is on, tells the page view to navigate there.

use crate::tree::{NavigationTree, NodeId};
use docnav_core::{SymbolEntry, TargetUrl};
use serde::Serialize;
use std::fmt;

/// Where a selection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrigin {
    /// A search result
    Search,
    /// A table-of-contents node
    Tree,
}

/// Something that can be selected
#[derive(Debug, Clone, Copy)]
pub enum SelectionTarget<'a> {
    /// A search result entry
    Entry(&'a SymbolEntry),
    /// A node of the navigation tree
    Node(&'a NavigationTree, NodeId),
}

/// A location ready for the page view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUrl {
    /// Full URL: base, site page and anchor
    pub url: String,
    /// Target the URL was built from
    pub target: TargetUrl,
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Request for the page view to show a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEvent {
    /// Location to show
    pub url: ResolvedUrl,
    /// What was selected
    pub origin: SelectionOrigin,
}

/// Receives navigation events
pub trait NavigationSink {
    /// Handle one event
    fn navigate(&mut self, event: &NavigationEvent);
}

/// Maps selections to locations and forwards them when panels are synced
pub struct SelectionCoordinator {
    base_url: String,
    panel_sync: bool,
    sink: Option<Box<dyn NavigationSink + Send>>,
}

impl fmt::Debug for SelectionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionCoordinator")
            .field("base_url", &self.base_url)
            .field("panel_sync", &self.panel_sync)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl SelectionCoordinator {
    /// Create a coordinator with panel sync on and no sink
    pub fn new(base_url: impl Into<String>) -> Self {
        SelectionCoordinator {
            base_url: base_url.into(),
            panel_sync: true,
            sink: None,
        }
    }

    /// Builder: set the initial panel sync state
    pub fn with_panel_sync(mut self, on: bool) -> Self {
        self.panel_sync = on;
        self
    }

    /// Install the page view's sink, replacing any previous one
    pub fn set_sink(&mut self, sink: Box<dyn NavigationSink + Send>) {
        self.sink = Some(sink);
    }

    /// Remove and return the sink
    pub fn take_sink(&mut self) -> Option<Box<dyn NavigationSink + Send>> {
        self.sink.take()
    }

    /// Whether selections are forwarded
    pub fn panel_sync(&self) -> bool {
        self.panel_sync
    }

    /// Turn forwarding on or off for the rest of the session
    pub fn set_panel_sync(&mut self, on: bool) {
        if self.panel_sync != on {
            tracing::debug!(target: "docnav::session", panel_sync = on, "Panel sync changed");
        }
        self.panel_sync = on;
    }

    /// Base prefixed to every resolved page
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Location of a target, without side effects
    ///
    /// `None` for a grouping node or an unknown node id.
    pub fn resolve(&self, target: SelectionTarget<'_>) -> Option<ResolvedUrl> {
        let url = match target {
            SelectionTarget::Entry(entry) => &entry.target_url,
            SelectionTarget::Node(tree, id) => tree.node(id)?.target_url.as_ref()?,
        };
        Some(self.join(url))
    }

    /// Resolve a target and forward it when panel sync is on
    ///
    /// Selecting the same target again yields the same URL and one more
    /// event, nothing else.
    pub fn select(&mut self, target: SelectionTarget<'_>) -> Option<ResolvedUrl> {
        let origin = match target {
            SelectionTarget::Entry(_) => SelectionOrigin::Search,
            SelectionTarget::Node(..) => SelectionOrigin::Tree,
        };
        let resolved = self.resolve(target)?;
        if self.panel_sync {
            if let Some(sink) = self.sink.as_mut() {
                sink.navigate(&NavigationEvent {
                    url: resolved.clone(),
                    origin,
                });
            }
        }
        tracing::debug!(target: "docnav::session", url = %resolved, synced = self.panel_sync, "Selection resolved");
        Some(resolved)
    }

    fn join(&self, target: &TargetUrl) -> ResolvedUrl {
        let mut url = String::with_capacity(self.base_url.len() + target.page().len() + 1);
        url.push_str(&self.base_url);
        if !self.base_url.is_empty() && !self.base_url.ends_with('/') {
            url.push('/');
        }
        url.push_str(target.site_page());
        if let Some(anchor) = target.anchor() {
            url.push('#');
            url.push_str(anchor);
        }
        ResolvedUrl {
            url,
            target: target.clone(),
        }
    }
}
