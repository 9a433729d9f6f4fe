//! Search benchmarks
//!
//! Run with: cargo bench --bench search
//!
//! Labels:
//! - Layer (store_*, index_*, matcher_*)
//! - Access pattern (hot_query, keystrokes)
//! - Corpus size (small, medium, large)
//!
//! Targets:
//! - index_lookup/hot_query: < 50µs (medium corpus)
//! - matcher_run/keystrokes: < 200µs per keystroke once shards are cached

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docnav::core::ShardScheme;
use docnav::search::manifest::ManifestEntry;
use docnav::search::{
    encode_json_shard, LabelledItem, MatchOptions, MemorySource, QueryMatcher, ShardManifest,
    ShardStore, ShardWriter, MANIFEST_FILE,
};
use std::sync::Arc;

// ============================================================================
// Constants and Utilities
// ============================================================================

/// Fixed seed for reproducible corpora
const BENCH_SEED: u64 = 0xDEADBEEF_CAFEBABE;

/// Simple LCG for deterministic pseudo-random labels
fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

const WORDS: [&str; 12] = [
    "gpio", "spi", "button", "interrupt", "clock", "base", "addr", "bit", "order", "reg", "config",
    "enable",
];

fn corpus(count: usize) -> Vec<LabelledItem> {
    let mut state = BENCH_SEED;
    (0..count)
        .map(|i| {
            let words = 1 + (lcg_next(&mut state) % 3) as usize;
            let label: Vec<&str> = (0..words)
                .map(|_| WORDS[(lcg_next(&mut state) % WORDS.len() as u64) as usize])
                .collect();
            LabelledItem::new(label.join("_").to_uppercase(), &format!("group___g{}.html#a{}", i % 40, i))
                .with_scope(format!("file{}.h", i % 7))
        })
        .collect()
}

fn store_for(items: Vec<LabelledItem>, granularity: usize) -> ShardStore {
    let scheme = ShardScheme::with_granularity(granularity).unwrap();
    let mut writer = ShardWriter::new(scheme);
    for item in items {
        writer.add(item);
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

// ============================================================================
// Benchmarks
// ============================================================================

fn index_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_lookup");
    for (name, size) in [("small", 500), ("medium", 5_000), ("large", 50_000)] {
        let store = store_for(corpus(size), 2);
        let mut matcher = QueryMatcher::new().with_options(MatchOptions {
            max_results: 0,
            kind_filter: None,
        });
        // Warm the shard cache and the index
        matcher.run("bu", &store);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("hot_query", name), &size, |b, _| {
            b.iter(|| matcher.index().lookup("button"))
        });
    }
    group.finish();
}

fn matcher_keystrokes(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher_run");
    let store = store_for(corpus(5_000), 1);
    let mut matcher = QueryMatcher::new();
    let typed = "button interrupt";
    let prefixes: Vec<&str> = (1..=typed.len()).map(|n| &typed[..n]).collect();
    group.throughput(Throughput::Elements(prefixes.len() as u64));
    group.bench_function("keystrokes", |b| {
        b.iter(|| {
            for prefix in &prefixes {
                matcher.run(prefix, &store);
            }
        })
    });
    group.finish();
}

fn store_cold_load(c: &mut Criterion) {
    let items = corpus(5_000);
    c.bench_function("store_load/cold_shard", |b| {
        b.iter_with_setup(
            || store_for(items.clone(), 1),
            |store| store.load_shard(&"b".into()).map(|s| s.entry_count()),
        )
    });
}

criterion_group!(benches, index_lookup, matcher_keystrokes, store_cold_load);
criterion_main!(benches);
