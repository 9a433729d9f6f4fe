//! Search session facade
//!
//! One [`SearchSession`] per page view. It owns the shard store, the query
//! matcher, the navigation tree and the selection coordinator, and exposes
//! the runtime surface: set the query text, get notified when the result set
//! changes, select a hit or a tree node.
//!
//! The navigation tree is optional. A missing or broken descriptor is logged
//! and search keeps working without it.

use crate::config::DocNavConfig;
use docnav_core::{Result, SymbolEntry, SymbolKind};
use docnav_navtree::{
    parse_descriptors, DirChunkResolver, NavigationSink, NavigationTree, NodeId, ResolvedUrl,
    SelectionCoordinator, SelectionTarget,
};
use docnav_search::{
    Completion, DirSource, Hit, MatchOptions, QueryMatcher, ResultSet, ShardLoad, ShardStore,
    Submission, Ticket,
};
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Observers
// ============================================================================

/// Change to the visible result set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultChange<'a> {
    /// The query was cleared; nothing is shown
    Cleared,
    /// New results for the latest query
    Updated(&'a ResultSet),
}

/// Receives result set changes
pub trait ResultObserver: Send {
    /// Called once per change, in registration order
    fn results_changed(&mut self, change: ResultChange<'_>);
}

// ============================================================================
// SearchSession
// ============================================================================

/// Runtime query surface for one documentation site
pub struct SearchSession {
    config: DocNavConfig,
    store: ShardStore,
    matcher: QueryMatcher,
    tree: Option<NavigationTree>,
    selection: SelectionCoordinator,
    observers: Vec<Box<dyn ResultObserver>>,
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("store", &self.store)
            .field("state", &self.matcher.state())
            .field("tree_nodes", &self.tree.as_ref().map(NavigationTree::len))
            .field("selection", &self.selection)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl SearchSession {
    /// Open the site rooted at `root`
    ///
    /// # Errors
    ///
    /// Only an invalid config is fatal. An unreadable manifest degrades
    /// search results; an unreadable descriptor leaves the tree absent.
    pub fn open(config: DocNavConfig, root: &Path) -> Result<Self> {
        config.validate()?;
        let source = DirSource::new(config.index_path(root));
        let store = ShardStore::new(Arc::new(source))
            .with_format(config.shard_format()?)
            .with_manifest_name(config.manifest_file.clone());

        if let Err(e) = store.manifest() {
            tracing::warn!(target: "docnav::session", error = %e, "Search index unavailable, results will be degraded");
        }

        let tree = match load_tree(&config, root) {
            Ok(tree) => Some(tree),
            Err(e) => {
                tracing::warn!(
                    target: "docnav::session",
                    path = %config.navtree_path(root).display(),
                    error = %e,
                    "Navigation tree unavailable"
                );
                None
            }
        };

        tracing::info!(
            target: "docnav::session",
            root = %root.display(),
            format = %config.format,
            tree = tree.is_some(),
            "Search session opened"
        );
        Ok(Self::from_parts(config, store, tree))
    }

    /// Open `root` using its `docnav.toml`, or defaults when there is none
    pub fn open_dir(root: &Path) -> Result<Self> {
        Self::open(DocNavConfig::load_or_default(root)?, root)
    }

    /// Assemble a session from an existing store and tree
    pub fn from_parts(config: DocNavConfig, store: ShardStore, tree: Option<NavigationTree>) -> Self {
        let matcher = QueryMatcher::new().with_options(MatchOptions {
            max_results: config.max_results,
            kind_filter: None,
        });
        let selection =
            SelectionCoordinator::new(config.base_url.clone()).with_panel_sync(config.panel_sync);
        SearchSession {
            config,
            store,
            matcher,
            tree,
            selection,
            observers: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Active configuration
    pub fn config(&self) -> &DocNavConfig {
        &self.config
    }

    /// Shard store
    pub fn store(&self) -> &ShardStore {
        &self.store
    }

    /// Query matcher
    pub fn matcher(&self) -> &QueryMatcher {
        &self.matcher
    }

    /// Latest resolved results
    pub fn results(&self) -> Option<&ResultSet> {
        self.matcher.last_results()
    }

    /// Navigation tree, if it loaded
    pub fn navtree(&self) -> Option<&NavigationTree> {
        self.tree.as_ref()
    }

    /// Navigation tree for expand/collapse
    pub fn navtree_mut(&mut self) -> Option<&mut NavigationTree> {
        self.tree.as_mut()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Register an observer of result set changes
    pub fn add_observer(&mut self, observer: Box<dyn ResultObserver>) {
        self.observers.push(observer);
    }

    /// Set the current query text and resolve it
    ///
    /// Observers are notified with the new results, or with
    /// [`ResultChange::Cleared`] when the text normalizes to nothing.
    pub fn set_query(&mut self, text: &str) -> Option<&ResultSet> {
        match self.matcher.run(text, &self.store) {
            Some(results) => self.notify(ResultChange::Updated(&results)),
            None => self.notify(ResultChange::Cleared),
        }
        self.matcher.last_results()
    }

    /// First half of an asynchronous query: register the text
    ///
    /// Load the ticket's shards (see [`SearchSession::load`]) and hand the
    /// outcomes to [`SearchSession::complete`].
    pub fn submit(&mut self, text: &str) -> Submission {
        let submission = self.matcher.submit(text, &self.store);
        if let Submission::Cleared { .. } = submission {
            self.notify(ResultChange::Cleared);
        }
        submission
    }

    /// Fetch the shards a ticket needs
    pub fn load(&self, ticket: &Ticket) -> Vec<ShardLoad> {
        self.store.load_all(&ticket.shards)
    }

    /// Second half of an asynchronous query
    ///
    /// Observers only hear about completions that are still current.
    pub fn complete(&mut self, ticket: &Ticket, loads: Vec<ShardLoad>) -> Completion {
        let completion = self.matcher.complete(ticket, loads);
        if let Completion::Resolved(results) = &completion {
            self.notify(ResultChange::Updated(results));
        }
        completion
    }

    /// Restrict results to one kind from the next query on
    pub fn set_kind_filter(&mut self, kind: Option<SymbolKind>) {
        self.matcher.set_kind_filter(kind);
    }

    fn notify(&mut self, change: ResultChange<'_>) {
        for observer in &mut self.observers {
            observer.results_changed(change);
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Install the page view's navigation sink
    pub fn set_navigation_sink(&mut self, sink: Box<dyn NavigationSink + Send>) {
        self.selection.set_sink(sink);
    }

    /// Whether selections are forwarded to the page view
    pub fn panel_sync(&self) -> bool {
        self.selection.panel_sync()
    }

    /// Turn panel sync on or off for the rest of the session
    pub fn set_panel_sync(&mut self, on: bool) {
        self.selection.set_panel_sync(on);
    }

    /// Select a search hit
    ///
    /// With panel sync on, the tree is also expanded down to the hit's page.
    pub fn select_hit(&mut self, hit: &Hit) -> Option<ResolvedUrl> {
        self.select_entry(&hit.entry)
    }

    /// Select a symbol entry
    pub fn select_entry(&mut self, entry: &SymbolEntry) -> Option<ResolvedUrl> {
        let resolved = self.selection.select(SelectionTarget::Entry(entry))?;
        if self.selection.panel_sync() {
            if let Some(tree) = self.tree.as_mut() {
                tree.expand_active(&entry.target_url.to_string());
            }
        }
        Some(resolved)
    }

    /// Select a tree node
    ///
    /// `None` without a tree, for an unknown id, or for a grouping node.
    pub fn select_node(&mut self, id: NodeId) -> Option<ResolvedUrl> {
        let tree = self.tree.as_ref()?;
        self.selection.select(SelectionTarget::Node(tree, id))
    }

    /// Expand the tree down to the page being shown
    pub fn sync_tree_to(&mut self, current_url: &str) -> Vec<NodeId> {
        self.tree
            .as_mut()
            .map(|t| t.expand_active(current_url))
            .unwrap_or_default()
    }
}

/// Read and build the navigation tree named by `config`
fn load_tree(config: &DocNavConfig, root: &Path) -> Result<NavigationTree> {
    let path = config.navtree_path(root);
    let format = config.descriptor_format()?;
    let bytes = std::fs::read(&path)?;
    let descriptors = parse_descriptors(&bytes, format)?;
    let chunk_dir = path.parent().unwrap_or(root);
    NavigationTree::build_with(descriptors, &DirChunkResolver::new(chunk_dir, format))
}
