//! Incremental query matcher
//!
//! Turns keystrokes into ranked, grouped result sets.
//!
//! # State machine
//!
//! ```text
//!            empty input
//!   ┌──────────────────────────┐
//!   ▼                          │
//! Idle ──submit──▶ Pending(seq) ──complete(seq is latest)──▶ Resolved(seq)
//!                      │
//!                      └──complete(newer seq issued)──▶ Stale(seq), discarded
//! ```
//!
//! Every submission (including clearing the input) takes a new sequence
//! number. A completion is only turned into a result set when its ticket
//! carries the latest number, so a slow shard for `"but"` can never overwrite
//! the results for `"button"`. Superseded fetches are not aborted; their
//! shards are still merged into the index because the next query will
//! likely need them.
//!
//! Shard loads are the only suspension point. [`QueryMatcher::submit`] hands
//! out a [`Ticket`] naming the shards to fetch; the caller fetches them in
//! whatever order it likes and passes the outcomes to
//! [`QueryMatcher::complete`]. [`QueryMatcher::run`] does both synchronously.

use crate::index::SymbolIndex;
use crate::manifest::ShardManifest;
use crate::rank::{group, Hit, ResultGroup};
use crate::store::{ShardLoad, ShardStore};
use docnav_core::{normalize, ShardKey, ShardScheme, SymbolKind};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

// ============================================================================
// Types
// ============================================================================

/// Observable matcher state for the latest query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherState {
    /// No query; results cleared
    Idle,
    /// Waiting for the shards of this query
    Pending(u64),
    /// Results for this query are current
    Resolved(u64),
    /// This query's completion arrived after a newer query was issued
    Stale(u64),
}

/// Work order for one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Sequence number of the query
    pub seq: u64,
    /// Normalized query text
    pub query: String,
    /// Shards the query needs
    pub shards: Vec<ShardKey>,
    /// The shard catalog could not be read
    pub catalog_failed: bool,
}

/// Result of submitting input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Input normalized to nothing; matcher is idle
    Cleared {
        /// Sequence number consumed by the clear
        seq: u64,
    },
    /// Shards must be loaded before the query resolves
    Pending(Ticket),
}

/// Result of completing a ticket
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Ticket was the latest; results are current
    Resolved(ResultSet),
    /// A newer query was issued; results discarded
    Stale {
        /// Sequence number of the discarded query
        seq: u64,
        /// Latest issued sequence number
        latest: u64,
    },
}

/// Ranked, grouped results for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    /// Sequence number of the query
    pub seq: u64,
    /// Normalized query text
    pub query: String,
    /// Hits in rank order
    pub hits: Vec<Hit>,
    /// Display groups over `hits`
    pub groups: Vec<ResultGroup>,
    /// Some required shard (or the catalog) failed to load
    pub degraded: bool,
    /// Shards that failed to load
    pub failed_shards: Vec<ShardKey>,
    /// Malformed records skipped in the shards used
    pub skipped_entries: usize,
    /// More hits matched than `max_results` allowed
    pub truncated: bool,
}

impl ResultSet {
    /// Whether there is nothing to show
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Matching options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Cap on ranked hits; `0` means unlimited
    pub max_results: usize,
    /// Only report entries of this kind
    pub kind_filter: Option<SymbolKind>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            max_results: 100,
            kind_filter: None,
        }
    }
}

/// Bookkeeping for the query currently shown
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    /// Normalized text of the latest query
    pub input: String,
    /// Shards that have loaded for any query so far
    pub resolved_shards: BTreeSet<ShardKey>,
    /// Latest result set that resolved
    pub last_results: Option<ResultSet>,
    /// Latest issued sequence number
    pub seq: u64,
}

// ============================================================================
// QueryMatcher
// ============================================================================

/// Turns query text into result sets, discarding stale completions
#[derive(Debug)]
pub struct QueryMatcher {
    index: SymbolIndex,
    state: MatcherState,
    query: QueryState,
    options: MatchOptions,
}

impl Default for QueryMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryMatcher {
    /// Create an idle matcher with default options
    pub fn new() -> Self {
        QueryMatcher {
            index: SymbolIndex::new(ShardScheme::default()),
            state: MatcherState::Idle,
            query: QueryState::default(),
            options: MatchOptions::default(),
        }
    }

    /// Builder: set options
    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Current state of the latest query
    pub fn state(&self) -> MatcherState {
        self.state
    }

    /// Query bookkeeping
    pub fn query_state(&self) -> &QueryState {
        &self.query
    }

    /// Latest resolved results, if any
    pub fn last_results(&self) -> Option<&ResultSet> {
        self.query.last_results.as_ref()
    }

    /// Index built from the shards loaded so far
    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Current options
    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Restrict results to one kind, or lift the restriction
    ///
    /// Takes effect from the next completion.
    pub fn set_kind_filter(&mut self, kind: Option<SymbolKind>) {
        self.options.kind_filter = kind;
    }

    /// Set the result cap; `0` means unlimited
    pub fn set_max_results(&mut self, max_results: usize) {
        self.options.max_results = max_results;
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Register new input and work out which shards it needs
    ///
    /// The shard catalog comes from `store`; it is read once and cached there.
    pub fn submit(&mut self, text: &str, store: &ShardStore) -> Submission {
        let manifest = store.manifest();
        match &manifest {
            Ok(m) => self.submit_with_catalog(text, Some(m)),
            Err(e) => {
                tracing::warn!(target: "docnav::search", error = %e, "Shard catalog unavailable");
                self.submit_with_catalog(text, None)
            }
        }
    }

    /// Register new input against an already loaded catalog
    ///
    /// `None` means the catalog failed to load; the query will resolve
    /// degraded and empty.
    pub fn submit_with_catalog(
        &mut self,
        text: &str,
        catalog: Option<&Arc<ShardManifest>>,
    ) -> Submission {
        let query = normalize(text);
        self.query.seq += 1;
        let seq = self.query.seq;
        self.query.input = query.clone();

        if query.is_empty() {
            self.state = MatcherState::Idle;
            self.query.last_results = None;
            tracing::debug!(target: "docnav::search", seq, "Query cleared");
            return Submission::Cleared { seq };
        }

        if let Some(manifest) = catalog {
            if self.index.scheme() != &manifest.scheme {
                self.index = SymbolIndex::new(manifest.scheme);
                self.query.resolved_shards.clear();
            }
        }

        let shards = catalog
            .map(|m| m.candidate_shards(&query))
            .unwrap_or_default();
        self.state = MatcherState::Pending(seq);
        tracing::debug!(target: "docnav::search", seq, query = %query, shards = shards.len(), "Query pending");

        Submission::Pending(Ticket {
            seq,
            query,
            shards,
            catalog_failed: catalog.is_none(),
        })
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Deliver the shard outcomes for a ticket
    ///
    /// Successful shards are merged into the index whether or not the ticket
    /// is still current. Failed shards degrade the result instead of failing
    /// it.
    pub fn complete(&mut self, ticket: &Ticket, loads: Vec<ShardLoad>) -> Completion {
        let mut failed = Vec::new();
        for load in loads {
            match load.result {
                Ok(shard) => {
                    self.query.resolved_shards.insert(load.shard);
                    self.index.insert_shard(shard);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "docnav::search",
                        seq = ticket.seq,
                        shard = %load.shard,
                        error = %e,
                        "Shard unavailable, results degraded"
                    );
                    failed.push(load.shard);
                }
            }
        }

        if ticket.seq != self.query.seq {
            tracing::debug!(
                target: "docnav::search",
                seq = ticket.seq,
                latest = self.query.seq,
                "Discarding stale completion"
            );
            return Completion::Stale {
                seq: ticket.seq,
                latest: self.query.seq,
            };
        }

        // Shards the ticket named but nobody delivered count as failed too.
        for shard in &ticket.shards {
            if !self.index.contains_shard(shard) && !failed.contains(shard) {
                failed.push(shard.clone());
            }
        }

        let results = self.resolve(ticket, failed);
        self.state = MatcherState::Resolved(ticket.seq);
        self.query.last_results = Some(results.clone());
        Completion::Resolved(results)
    }

    /// Submit, load through the store and complete in one go
    ///
    /// Returns `None` when the input cleared the query.
    pub fn run(&mut self, text: &str, store: &ShardStore) -> Option<ResultSet> {
        match self.submit(text, store) {
            Submission::Cleared { .. } => None,
            Submission::Pending(ticket) => {
                let loads = store.load_all(&ticket.shards);
                match self.complete(&ticket, loads) {
                    Completion::Resolved(results) => Some(results),
                    // Nothing can submit between our submit and complete.
                    Completion::Stale { .. } => self.query.last_results.clone(),
                }
            }
        }
    }

    /// State of a query by sequence number
    ///
    /// Any query older than the latest is stale, whether or not its shards
    /// have arrived.
    pub fn state_of(&self, seq: u64) -> MatcherState {
        if seq == self.query.seq {
            self.state
        } else {
            MatcherState::Stale(seq)
        }
    }

    fn resolve(&self, ticket: &Ticket, failed: Vec<ShardKey>) -> ResultSet {
        let mut hits = self.index.lookup_in(&ticket.query, &ticket.shards);
        if let Some(kind) = self.options.kind_filter {
            hits.retain(|h| h.entry.kind == kind);
        }

        let truncated = self.options.max_results > 0 && hits.len() > self.options.max_results;
        if truncated {
            hits.truncate(self.options.max_results);
        }

        let skipped_entries = ticket
            .shards
            .iter()
            .filter_map(|k| self.index.shard(k))
            .map(|s| s.skipped())
            .sum();
        let groups = group(&hits);
        let degraded = ticket.catalog_failed || !failed.is_empty();

        tracing::debug!(
            target: "docnav::search",
            seq = ticket.seq,
            hits = hits.len(),
            degraded,
            "Query resolved"
        );

        ResultSet {
            seq: ticket.seq,
            query: ticket.query.clone(),
            hits,
            groups,
            degraded,
            failed_shards: failed,
            skipped_entries,
            truncated,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestEntry;
    use crate::shard::{IndexShard, ShardRecord};
    use docnav_core::{Error, SymbolEntry, TargetUrl};

    fn entry(key: &str, name: &str, url: &str, scope: Option<&str>) -> SymbolEntry {
        SymbolEntry::new(key, name, TargetUrl::parse(url), scope.map(String::from), None)
    }

    fn b_shard() -> Arc<IndexShard> {
        Arc::new(IndexShard::new(
            ShardKey::new("b"),
            vec![
                ShardRecord::new(
                    "bdcr",
                    vec![entry("bdcr", "BDCR", "struct_r_c_c___reg_def__t.html#a59", Some("RCC_RegDef_t"))],
                ),
                ShardRecord::new(
                    "bsrr",
                    vec![entry("bsrr", "BSRR", "struct_g_p_i_ox___reg_def__t.html#af8", Some("GPIOx_RegDef_t"))],
                ),
                ShardRecord::new(
                    "button interrupt",
                    vec![entry("button interrupt", "Project 002: User Button Interrupt", "index.html#autotoc_md21", None)],
                ),
            ],
        ))
    }

    fn catalog(keys: &[&str]) -> Arc<ShardManifest> {
        let mut manifest = ShardManifest::new(ShardScheme::default());
        for key in keys {
            manifest.shards.push(ManifestEntry {
                key: ShardKey::new(*key),
                file: format!("all_{}.json", key),
                entries: 0,
            });
        }
        Arc::new(manifest)
    }

    fn loaded(shard: Arc<IndexShard>) -> ShardLoad {
        ShardLoad {
            shard: shard.key().clone(),
            result: Ok(shard),
        }
    }

    fn pending(submission: Submission) -> Ticket {
        match submission {
            Submission::Pending(ticket) => ticket,
            other => panic!("expected pending, got {:?}", other),
        }
    }

    fn resolved(completion: Completion) -> ResultSet {
        match completion {
            Completion::Resolved(results) => results,
            other => panic!("expected resolved, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_names_covering_shards() {
        let cat = catalog(&["a", "b", "c"]);
        let mut matcher = QueryMatcher::new();
        let ticket = pending(matcher.submit_with_catalog("But", Some(&cat)));
        assert_eq!(ticket.seq, 1);
        assert_eq!(ticket.query, "but");
        assert_eq!(ticket.shards, vec![ShardKey::new("b")]);
        assert_eq!(matcher.state(), MatcherState::Pending(1));
    }

    #[test]
    fn test_out_of_order_completion_is_discarded() {
        let cat = catalog(&["b"]);
        let mut matcher = QueryMatcher::new();
        let but = pending(matcher.submit_with_catalog("but", Some(&cat)));
        let button = pending(matcher.submit_with_catalog("button", Some(&cat)));

        let results = resolved(matcher.complete(&button, vec![loaded(b_shard())]));
        assert_eq!(results.query, "button");
        assert_eq!(results.hits.len(), 1);

        let late = matcher.complete(&but, vec![loaded(b_shard())]);
        assert_eq!(late, Completion::Stale { seq: 1, latest: 2 });
        assert_eq!(matcher.state(), MatcherState::Resolved(2));
        assert_eq!(matcher.state_of(1), MatcherState::Stale(1));
        assert_eq!(matcher.last_results().unwrap().query, "button");
    }

    #[test]
    fn test_stale_completion_still_merges_shards() {
        let cat = catalog(&["b"]);
        let mut matcher = QueryMatcher::new();
        let old = pending(matcher.submit_with_catalog("bd", Some(&cat)));
        let _new = pending(matcher.submit_with_catalog("bs", Some(&cat)));
        matcher.complete(&old, vec![loaded(b_shard())]);
        assert!(matcher.index().contains_shard(&ShardKey::new("b")));
        assert!(matcher.query_state().resolved_shards.contains(&ShardKey::new("b")));
    }

    #[test]
    fn test_clearing_input_goes_idle_and_supersedes() {
        let cat = catalog(&["b"]);
        let mut matcher = QueryMatcher::new();
        let ticket = pending(matcher.submit_with_catalog("b", Some(&cat)));
        resolved(matcher.complete(&ticket, vec![loaded(b_shard())]));
        assert!(matcher.last_results().is_some());

        let slow = pending(matcher.submit_with_catalog("bd", Some(&cat)));
        assert_eq!(matcher.submit_with_catalog(" -- ", Some(&cat)), Submission::Cleared { seq: 3 });
        assert_eq!(matcher.state(), MatcherState::Idle);
        assert!(matcher.last_results().is_none());

        assert!(matches!(matcher.complete(&slow, vec![]), Completion::Stale { .. }));
        assert_eq!(matcher.state(), MatcherState::Idle);
    }

    #[test]
    fn test_failed_shard_degrades_result() {
        let cat = catalog(&["b"]);
        let mut matcher = QueryMatcher::new();
        let ticket = pending(matcher.submit_with_catalog("b", Some(&cat)));
        let b = ShardKey::new("b");
        let results = resolved(matcher.complete(
            &ticket,
            vec![ShardLoad {
                shard: b.clone(),
                result: Err(Error::shard_load(b.clone(), "gone")),
            }],
        ));
        assert!(results.degraded);
        assert!(results.is_empty());
        assert_eq!(results.failed_shards, vec![b]);
    }

    #[test]
    fn test_undelivered_shard_counts_as_failed() {
        let cat = catalog(&["b"]);
        let mut matcher = QueryMatcher::new();
        let ticket = pending(matcher.submit_with_catalog("b", Some(&cat)));
        let results = resolved(matcher.complete(&ticket, vec![]));
        assert!(results.degraded);
        assert_eq!(results.failed_shards, vec![ShardKey::new("b")]);
    }

    #[test]
    fn test_missing_catalog_resolves_degraded_and_empty() {
        let mut matcher = QueryMatcher::new();
        let ticket = pending(matcher.submit_with_catalog("b", None));
        assert!(ticket.catalog_failed);
        assert!(ticket.shards.is_empty());
        let results = resolved(matcher.complete(&ticket, vec![]));
        assert!(results.degraded);
        assert!(results.is_empty());
    }

    #[test]
    fn test_kind_filter_and_truncation() {
        let cat = catalog(&["b"]);
        let mut matcher = QueryMatcher::new().with_options(MatchOptions {
            max_results: 1,
            kind_filter: None,
        });
        let ticket = pending(matcher.submit_with_catalog("b", Some(&cat)));
        let results = resolved(matcher.complete(&ticket, vec![loaded(b_shard())]));
        assert_eq!(results.hits.len(), 1);
        assert!(results.truncated);

        matcher.set_max_results(0);
        matcher.set_kind_filter(Some(SymbolKind::Page));
        let ticket = pending(matcher.submit_with_catalog("b", Some(&cat)));
        let results = resolved(matcher.complete(&ticket, vec![]));
        assert!(!results.truncated);
        assert!(!results.degraded);
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].entry.display_name, "Project 002: User Button Interrupt");
    }

    #[test]
    fn test_results_are_grouped() {
        let cat = catalog(&["b"]);
        let mut matcher = QueryMatcher::new();
        let ticket = pending(matcher.submit_with_catalog("b", Some(&cat)));
        let results = resolved(matcher.complete(&ticket, vec![loaded(b_shard())]));
        let shape: Vec<(SymbolKind, Option<&str>)> = results
            .groups
            .iter()
            .map(|g| (g.kind, g.scope.as_deref()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (SymbolKind::Page, None),
                (SymbolKind::Variable, Some("RCC_RegDef_t")),
                (SymbolKind::Variable, Some("GPIOx_RegDef_t")),
            ]
        );
    }

    #[test]
    fn test_scheme_change_resets_index() {
        let cat = catalog(&["b"]);
        let mut matcher = QueryMatcher::new();
        let ticket = pending(matcher.submit_with_catalog("b", Some(&cat)));
        matcher.complete(&ticket, vec![loaded(b_shard())]);

        let mut wider = ShardManifest::new(ShardScheme::with_granularity(2).unwrap());
        wider.shards.push(ManifestEntry {
            key: ShardKey::new("bd"),
            file: "all_bd.json".into(),
            entries: 1,
        });
        let ticket = pending(matcher.submit_with_catalog("bd", Some(&Arc::new(wider))));
        assert_eq!(ticket.shards, vec![ShardKey::new("bd")]);
        assert_eq!(matcher.index().entry_count(), 0);
        assert!(matcher.query_state().resolved_shards.is_empty());
    }
}
