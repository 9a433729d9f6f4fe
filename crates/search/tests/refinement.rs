//! Property tests for query refinement

use docnav_core::ShardScheme;
use docnav_search::{
    encode_json_shard, LabelledItem, MatchOptions, MemorySource, QueryMatcher, ShardManifest,
    ShardStore, ShardWriter, MANIFEST_FILE,
};
use docnav_search::manifest::ManifestEntry;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn store_for(labels: &[String], granularity: usize) -> ShardStore {
    let scheme = ShardScheme::with_granularity(granularity).unwrap();
    let mut writer = ShardWriter::new(scheme);
    for (i, label) in labels.iter().enumerate() {
        writer.add(LabelledItem::new(label.clone(), &format!("page{}.html", i)));
    }
    let source = Arc::new(MemorySource::new());
    let mut manifest = ShardManifest::new(scheme);
    for shard in writer.build() {
        let file = writer.file_name(shard.key());
        source.insert(file.clone(), encode_json_shard(&shard).unwrap());
        manifest.shards.push(ManifestEntry {
            key: shard.key().clone(),
            file,
            entries: shard.entry_count(),
        });
    }
    source.insert(MANIFEST_FILE, serde_json::to_vec(&manifest).unwrap());
    ShardStore::new(source)
}

fn identities(matcher: &mut QueryMatcher, store: &ShardStore, query: &str) -> HashSet<String> {
    matcher
        .run(query, store)
        .map(|r| {
            r.hits
                .iter()
                .map(|h| format!("{}|{}", h.entry.display_name, h.entry.target_url))
                .collect()
        })
        .unwrap_or_default()
}

proptest! {
    /// Extending a query never adds results
    #[test]
    fn test_refinement_is_monotonic(
        labels in prop::collection::vec("[ab]{1,3}( [ab]{1,3}){0,2}", 1..12),
        query in "[ab ]{1,6}",
        cut in 0usize..6,
        granularity in 1usize..=2,
    ) {
        let store = store_for(&labels, granularity);
        let mut matcher = QueryMatcher::new().with_options(MatchOptions { max_results: 0, kind_filter: None });

        let cut = cut.min(query.len());
        let shorter = identities(&mut matcher, &store, &query[..cut]);
        let longer = identities(&mut matcher, &store, &query);

        if !query[..cut].trim().is_empty() {
            prop_assert!(longer.is_subset(&shorter), "{:?} not within {:?}", longer, shorter);
        }
    }

    /// The same query against the same shards gives the same hits
    #[test]
    fn test_lookup_is_deterministic(
        labels in prop::collection::vec("[abc]{1,4}( [abc]{1,4}){0,2}", 1..10),
        query in "[abc]{1,3}",
    ) {
        let store = store_for(&labels, 1);
        let mut first = QueryMatcher::new();
        let mut second = QueryMatcher::new();
        let a = first.run(&query, &store).map(|r| r.hits);
        let b = second.run(&query, &store).map(|r| r.hits);
        prop_assert_eq!(a, b);
    }
}
