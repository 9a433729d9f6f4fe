//! Session configuration via `docnav.toml`
//!
//! The config file sits in the documentation root and names where the
//! search index and the navigation descriptor live, which encoding they use,
//! and the runtime defaults for panel sync and result capping. A missing key
//! takes its default, so an empty file is a valid config.

use docnav_core::{Error, Result};
use docnav_navtree::DescriptorFormat;
use docnav_search::{ShardFormat, MANIFEST_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name placed in the documentation root.
pub const CONFIG_FILE_NAME: &str = "docnav.toml";

/// Session configuration loaded from `docnav.toml`.
///
/// # Example
///
/// ```toml
/// index_dir = "search"
/// navtree_file = "navtreedata.js"
/// format = "doxygen"
/// panel_sync = true
/// max_results = 50
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNavConfig {
    /// Directory holding the manifest and shard files, relative to the root.
    #[serde(default = "default_index_dir")]
    pub index_dir: String,
    /// Manifest file name inside `index_dir`.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    /// Navigation descriptor file, relative to the root.
    #[serde(default = "default_navtree_file")]
    pub navtree_file: String,
    /// Encoding of shards and descriptors: `"json"` or `"doxygen"`.
    #[serde(default = "default_format")]
    pub format: String,
    /// Initial panel sync state.
    #[serde(default = "default_panel_sync")]
    pub panel_sync: bool,
    /// Cap on results per query; `0` means unlimited.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Prefix joined to every resolved page.
    #[serde(default)]
    pub base_url: String,
}

fn default_index_dir() -> String {
    "search".to_string()
}

fn default_manifest_file() -> String {
    MANIFEST_FILE.to_string()
}

fn default_navtree_file() -> String {
    "navtree.json".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

fn default_panel_sync() -> bool {
    true
}

fn default_max_results() -> usize {
    100
}

impl Default for DocNavConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            manifest_file: default_manifest_file(),
            navtree_file: default_navtree_file(),
            format: default_format(),
            panel_sync: default_panel_sync(),
            max_results: default_max_results(),
            base_url: String::new(),
        }
    }
}

impl DocNavConfig {
    /// Parse the format string into a shard encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"json"` or `"doxygen"`.
    pub fn shard_format(&self) -> Result<ShardFormat> {
        ShardFormat::parse(&self.format).ok_or_else(|| {
            Error::Config(format!(
                "Invalid format '{}' in {}. Expected \"json\" or \"doxygen\".",
                self.format, CONFIG_FILE_NAME
            ))
        })
    }

    /// Descriptor encoding matching the shard encoding.
    pub fn descriptor_format(&self) -> Result<DescriptorFormat> {
        Ok(match self.shard_format()? {
            ShardFormat::Json => DescriptorFormat::Json,
            ShardFormat::Doxygen => DescriptorFormat::Doxygen,
        })
    }

    /// Check every field that can be wrong.
    pub fn validate(&self) -> Result<()> {
        self.shard_format()?;
        for (name, value) in [
            ("index_dir", &self.index_dir),
            ("manifest_file", &self.manifest_file),
            ("navtree_file", &self.navtree_file),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("'{}' must not be empty", name)));
            }
            if Path::new(value).is_absolute() {
                return Err(Error::Config(format!(
                    "'{}' must be relative to the documentation root, got '{}'",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Index directory under `root`.
    pub fn index_path(&self, root: &Path) -> PathBuf {
        root.join(&self.index_dir)
    }

    /// Navigation descriptor path under `root`.
    pub fn navtree_path(&self, root: &Path) -> PathBuf {
        root.join(&self.navtree_file)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# docnav configuration
#
# Directory holding manifest.json and the shard files (default: "search")
index_dir = "search"

# Manifest file name inside index_dir (default: "manifest.json")
manifest_file = "manifest.json"

# Navigation descriptor (default: "navtree.json")
# Use "navtreedata.js" together with format = "doxygen" for generated sites.
navtree_file = "navtree.json"

# Encoding of shards and descriptors: "json" (default) or "doxygen"
format = "json"

# Forward selections to the page view (default: true)
panel_sync = true

# Results per query, 0 = unlimited (default: 100)
max_results = 100

# Prefix joined to every resolved page (default: empty, keep relative)
# base_url = "https://docs.example.org/html"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: DocNavConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read `docnav.toml` from `root`, or use defaults when there is none.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::from_file(&path)
        } else {
            tracing::debug!(target: "docnav::session", root = %root.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }
}
