//! Generator-side shard writer
//!
//! Produces the shard files and manifest the runtime loader reads. Each
//! labelled item is filed under every token suffix of its normalized label,
//! so a query for a later word of a label ("button interrupt" for
//! "Project 002: User Button Interrupt") is answered by the shard of its own
//! leading characters.
//!
//! Records inside a shard are sorted by key; entries under one key keep the
//! order items were added in.

use crate::codec::encode_json_shard;
use crate::manifest::{write_manifest, ManifestEntry, ShardManifest, MANIFEST_FILE};
use crate::shard::{IndexShard, ShardRecord};
use docnav_core::normalize::token_suffixes;
use docnav_core::{normalize, Result, ShardKey, ShardScheme, SymbolEntry, SymbolKind, TargetUrl};
use std::collections::BTreeMap;
use std::path::Path;

/// Default file category prefix
pub const DEFAULT_CATEGORY: &str = "all";

/// One documented item as known to the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledItem {
    /// Label shown to the user
    pub display_name: String,
    /// Where the item is documented
    pub target_url: TargetUrl,
    /// Owning type, file or group
    pub scope: Option<String>,
    /// Category; inferred from the URL when absent
    pub kind: Option<SymbolKind>,
}

impl LabelledItem {
    /// Create an item with no scope and an inferred kind
    pub fn new(display_name: impl Into<String>, target_url: &str) -> Self {
        LabelledItem {
            display_name: display_name.into(),
            target_url: TargetUrl::parse(target_url),
            scope: None,
            kind: None,
        }
    }

    /// Builder: set the scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Builder: set the kind
    pub fn with_kind(mut self, kind: SymbolKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Partitions labelled items into shards
#[derive(Debug, Clone)]
pub struct ShardWriter {
    scheme: ShardScheme,
    category: String,
    items: Vec<LabelledItem>,
}

impl ShardWriter {
    /// Create a writer for a scheme
    pub fn new(scheme: ShardScheme) -> Self {
        ShardWriter {
            scheme,
            category: DEFAULT_CATEGORY.to_string(),
            items: Vec::new(),
        }
    }

    /// Builder: set the file category prefix
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Add an item
    pub fn add(&mut self, item: LabelledItem) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Partition the items into shards, in shard key order
    ///
    /// Items whose label normalizes to nothing are dropped.
    pub fn build(&self) -> Vec<IndexShard> {
        let mut by_key: BTreeMap<String, Vec<SymbolEntry>> = BTreeMap::new();
        for item in &self.items {
            let label = normalize(&docnav_core::plain_text(&item.display_name));
            for suffix in token_suffixes(&label) {
                by_key.entry(suffix.to_string()).or_default().push(SymbolEntry::new(
                    suffix,
                    item.display_name.clone(),
                    item.target_url.clone(),
                    item.scope.clone(),
                    item.kind,
                ));
            }
        }

        let mut by_shard: BTreeMap<ShardKey, Vec<ShardRecord>> = BTreeMap::new();
        for (key, entries) in by_key {
            by_shard
                .entry(self.scheme.shard_key(&key))
                .or_default()
                .push(ShardRecord::new(key, entries));
        }

        by_shard
            .into_iter()
            .map(|(key, records)| IndexShard::new(key, records))
            .collect()
    }

    /// File name for a shard
    pub fn file_name(&self, key: &ShardKey) -> String {
        format!("{}_{}.json", self.category, key.file_stem())
    }

    /// Build the shards and write them plus the manifest into `dir`
    pub fn write_to_dir(&self, dir: &Path) -> Result<ShardManifest> {
        std::fs::create_dir_all(dir)?;
        let mut manifest = ShardManifest::new(self.scheme);
        for shard in self.build() {
            let file = self.file_name(shard.key());
            std::fs::write(dir.join(&file), encode_json_shard(&shard)?)?;
            manifest.shards.push(ManifestEntry {
                key: shard.key().clone(),
                file,
                entries: shard.entry_count(),
            });
        }
        write_manifest(&dir.join(MANIFEST_FILE), &manifest)?;
        tracing::info!(
            target: "docnav::search",
            dir = %dir.display(),
            shards = manifest.shards.len(),
            entries = manifest.total_entries(),
            "Shards written"
        );
        Ok(manifest)
    }
}
