//! Configuration settings and validation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::Result;

/// Default name for a remote inventory file.
pub const DEFAULT_INVENTORY_NAME: &str = "objects.inv";

/// Default cache directory for converted inventories, relative to the
/// config file's directory.
pub const DEFAULT_CACHE_DIR: &str = "_inv";

/// Project configuration loaded from `_quarto.yml`.
///
/// Only the fields docwatch reads are modeled; unknown keys in the file
/// are ignored so the same config can drive other tools.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuartoConfig {
    /// Directory to watch for source changes, relative to the config file.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,

    /// Doc-generation pipeline settings.
    #[serde(default)]
    pub build: Option<BuildConfig>,

    /// Cross-project interlink settings. Absent means the feature is
    /// not enabled.
    #[serde(default)]
    pub interlinks: Option<InterlinksConfig>,
}

/// Doc-generation pipeline settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
    /// Command invoked to regenerate the docs. Defaults to `quarto render`.
    #[serde(default)]
    pub command: Option<String>,
}

/// The `interlinks` block of the config.
#[derive(Debug, Clone, Deserialize)]
pub struct InterlinksConfig {
    /// Cache directory for converted inventories, relative to the config
    /// file's directory.
    #[serde(default = "default_cache")]
    pub cache: PathBuf,

    /// External documentation sites to link against, keyed by source name.
    ///
    /// A `BTreeMap` keeps sync order (and cache output) deterministic.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

/// One external inventory source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the external documentation site.
    pub url: String,

    /// Inventory file name relative to `url`.
    #[serde(default = "default_inventory")]
    pub inv: String,
}

fn default_cache() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_inventory() -> String {
    DEFAULT_INVENTORY_NAME.to_string()
}

impl QuartoConfig {
    /// Load and parse the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if it is not valid YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Resolve the watch root against the config file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no `source_dir` is configured.
    pub fn watch_root(&self, config_dir: &Path) -> Result<PathBuf> {
        let dir = self
            .source_dir
            .as_ref()
            .ok_or_else(|| ConfigError::invalid("source_dir is required for watch mode"))?;
        Ok(config_dir.join(dir))
    }
}

impl InterlinksConfig {
    /// Absolute path of the cache file for source `key`.
    #[must_use]
    pub fn cache_path(&self, root: &Path, key: &str) -> PathBuf {
        root.join(&self.cache).join(format!("{key}_objects.json"))
    }
}

impl SourceConfig {
    /// Full URL of this source's inventory file.
    #[must_use]
    pub fn inventory_url(&self) -> String {
        format!("{}{}", self.url, self.inv)
    }

    /// Whether this entry points at the project's own site.
    ///
    /// Self-references never need a fetch or a cache file.
    #[must_use]
    pub fn is_self_reference(&self) -> bool {
        self.url == "/"
    }
}
