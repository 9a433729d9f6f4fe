//! Match tiers, ranking and grouping
//!
//! Ranking is purely positional: every candidate gets a [`MatchTier`] and the
//! list is stably sorted by tier, so entries of equal tier keep generation
//! order. Grouping only rearranges hits for display; it never drops any.

use docnav_core::normalize::token_starts;
use docnav_core::shard_key::compact;
use docnav_core::{SymbolEntry, SymbolKind};
use serde::Serialize;

// ============================================================================
// MatchTier
// ============================================================================

/// How a key matched a query, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Key equals the query
    Exact,
    /// Key starts with the query
    Prefix,
    /// A later token of the key starts with the query
    TokenPrefix,
    /// Query occurs inside the key with spaces ignored
    Substring,
}

/// Classify how a normalized key matches a normalized query
///
/// Returns `None` when the key does not match at all. An empty query matches
/// nothing.
///
/// # Example
///
/// ```
/// use docnav_search::rank::{classify, MatchTier};
///
/// assert_eq!(classify("user button interrupt", "button int"), Some(MatchTier::TokenPrefix));
/// assert_eq!(classify("bkpsram baseaddr", "bkpsrambase"), Some(MatchTier::Substring));
/// assert_eq!(classify("spi bit order", "interrupt"), None);
/// ```
pub fn classify(key: &str, query: &str) -> Option<MatchTier> {
    if query.is_empty() {
        return None;
    }
    if key == query {
        return Some(MatchTier::Exact);
    }
    if key.starts_with(query) {
        return Some(MatchTier::Prefix);
    }
    if token_starts(key)
        .into_iter()
        .skip(1)
        .any(|i| key[i..].starts_with(query))
    {
        return Some(MatchTier::TokenPrefix);
    }
    if compact(key).contains(&compact(query)) {
        return Some(MatchTier::Substring);
    }
    None
}

// ============================================================================
// Hits
// ============================================================================

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    /// Matched entry
    pub entry: SymbolEntry,
    /// Best tier the entry matched with
    pub tier: MatchTier,
    /// Generation-order position among the candidates
    pub position: usize,
}

/// Stable sort by tier, then generation position
pub fn rank(hits: &mut [Hit]) {
    hits.sort_by_key(|h| (h.tier, h.position));
}

/// Hits sharing a kind and scope, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultGroup {
    /// Kind shared by the group
    pub kind: SymbolKind,
    /// Scope shared by the group, markup removed
    pub scope: Option<String>,
    /// Indices into the ranked hit list, in ranked order
    pub hits: Vec<usize>,
}

/// Group ranked hits by kind, then by scope
///
/// Groups follow [`SymbolKind`] display order; scopes within a kind follow
/// the first appearance of the scope in the ranked list.
pub fn group(hits: &[Hit]) -> Vec<ResultGroup> {
    let mut groups: Vec<ResultGroup> = Vec::new();
    for kind in SymbolKind::ALL {
        let start = groups.len();
        for (i, hit) in hits.iter().enumerate().filter(|(_, h)| h.entry.kind == kind) {
            let scope = hit.entry.plain_scope();
            match groups[start..].iter_mut().find(|g| g.scope == scope) {
                Some(g) => g.hits.push(i),
                None => groups.push(ResultGroup {
                    kind,
                    scope,
                    hits: vec![i],
                }),
            }
        }
    }
    groups
}
