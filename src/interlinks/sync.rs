//! Inventory synchronization.
//!
//! For each configured external source, fetches the published inventory,
//! converts it to the local link-map format, and writes it to the cache
//! directory. Sources fail independently: one bad fetch never aborts the
//! others.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::inventory::Inventory;
use crate::config::{InterlinksConfig, QuartoConfig, SourceConfig};
use crate::error::InterlinksError;
use crate::Result;

/// Transport seam for fetching remote inventories.
///
/// Production uses [`HttpFetcher`]; tests inject an in-memory fake.
#[async_trait]
pub trait InventoryFetcher: Send + Sync {
    /// Fetch the raw bytes at `url`.
    ///
    /// # Errors
    ///
    /// Returns `InterlinksError::Fetch` on any transport failure.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP inventory fetcher.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_err = |e: reqwest::Error| InterlinksError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(fetch_err)?
            .error_for_status()
            .map_err(fetch_err)?;

        let bytes = response.bytes().await.map_err(fetch_err)?;
        Ok(bytes.to_vec())
    }
}

/// Outcome of one sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Cache files written (or, in dry-run mode, that would be written).
    pub written: Vec<PathBuf>,
    /// Source keys skipped as self-references.
    pub skipped: Vec<String>,
    /// Source keys whose fetch or conversion failed.
    pub failed: Vec<String>,
}

/// Synchronizes configured interlink sources into the local cache.
pub struct Synchronizer {
    fetcher: Box<dyn InventoryFetcher>,
    dry_run: bool,
}

impl Synchronizer {
    /// Create a synchronizer with an injected fetcher.
    #[must_use]
    pub fn new(fetcher: Box<dyn InventoryFetcher>, dry_run: bool) -> Self {
        Self { fetcher, dry_run }
    }

    /// Create a synchronizer that fetches over HTTP.
    #[must_use]
    pub fn over_http(dry_run: bool) -> Self {
        Self::new(Box::new(HttpFetcher::new()), dry_run)
    }

    /// Synchronize every source in the config's `interlinks` block.
    /// Cache files land under `root` (the config file's directory).
    ///
    /// Re-running against unchanged remote data rewrites each cache file
    /// with byte-identical content.
    ///
    /// # Errors
    ///
    /// Returns `InterlinksError::ConfigMissing` when the config has no
    /// `interlinks` block. Per-source failures are logged, recorded in
    /// the report, and do not abort the remaining sources.
    pub async fn sync(&self, config: &QuartoConfig, root: &Path) -> Result<SyncReport> {
        let interlinks = config
            .interlinks
            .as_ref()
            .ok_or(InterlinksError::ConfigMissing)?;

        let mut report = SyncReport::default();

        for (key, source) in &interlinks.sources {
            if source.is_self_reference() {
                tracing::debug!(source = %key, "Skipping self-referencing source");
                report.skipped.push(key.clone());
                continue;
            }

            match self.sync_source(key, source, interlinks, root).await {
                Ok(path) => report.written.push(path),
                Err(e) => {
                    tracing::error!(source = %key, error = %e, "Skipping interlink source");
                    report.failed.push(key.clone());
                }
            }
        }

        Ok(report)
    }

    /// Fetch, convert, and persist one source.
    async fn sync_source(
        &self,
        key: &str,
        source: &SourceConfig,
        interlinks: &InterlinksConfig,
        root: &Path,
    ) -> Result<PathBuf> {
        let url = source.inventory_url();
        let bytes = self.fetcher.fetch(&url).await?;
        let inventory = Inventory::parse(&url, &bytes)?;

        tracing::debug!(
            source = %key,
            project = %inventory.project,
            version = %inventory.version,
            symbols = inventory.items.len(),
            "Fetched inventory"
        );

        let links = inventory.into_links(&source.url);
        let dst = interlinks.cache_path(root, key);

        if self.dry_run {
            tracing::info!(source = %key, path = %dst.display(), "Dry run, not writing cache");
            return Ok(dst);
        }

        let write_err = |e: std::io::Error| InterlinksError::WriteCache {
            path: dst.clone(),
            reason: e.to_string(),
        };

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut json =
            serde_json::to_vec_pretty(&links).map_err(|e| InterlinksError::WriteCache {
                path: dst.clone(),
                reason: e.to_string(),
            })?;
        json.push(b'\n');
        fs::write(&dst, json).map_err(write_err)?;

        tracing::info!(
            source = %key,
            path = %dst.display(),
            symbols = links.len(),
            "Wrote inventory cache"
        );

        Ok(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::collections::BTreeMap;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeFetcher {
        responses: HashMap<String, Vec<u8>>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new(responses: HashMap<String, Vec<u8>>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl InventoryFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| {
                    InterlinksError::Fetch {
                        url: url.to_string(),
                        reason: "connection refused".to_string(),
                    }
                    .into()
                })
        }
    }

    fn encode_inventory(records: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"# Sphinx inventory version 2\n");
        bytes.extend_from_slice(b"# Project: sample\n");
        bytes.extend_from_slice(b"# Version: 1.0\n");
        bytes.extend_from_slice(b"# The remainder of this file is compressed using zlib.\n");

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(records.as_bytes()).unwrap();
        bytes.extend_from_slice(&encoder.finish().unwrap());
        bytes
    }

    fn config_yaml(yaml: &str) -> QuartoConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn test_sync_writes_cache_file() {
        let tmp = TempDir::new().unwrap();
        let config = config_yaml(
            "interlinks:\n  sources:\n    sample:\n      url: https://example.org/\n",
        );

        let mut responses = HashMap::new();
        responses.insert(
            "https://example.org/objects.inv".to_string(),
            encode_inventory("sample.run py:function 1 api.html#$ -\n"),
        );

        let sync = Synchronizer::new(Box::new(FakeFetcher::new(responses)), false);
        let report = sync.sync(&config, tmp.path()).await.unwrap();

        assert_eq!(report.written.len(), 1);
        let cache = tmp.path().join("_inv/sample_objects.json");
        let links: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(links["sample.run"], "https://example.org/api.html#sample.run");
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let config = config_yaml(
            "interlinks:\n  sources:\n    sample:\n      url: https://example.org/\n",
        );

        let mut responses = HashMap::new();
        responses.insert(
            "https://example.org/objects.inv".to_string(),
            encode_inventory(
                "sample.b py:function 1 b.html -\nsample.a py:function 1 a.html -\n",
            ),
        );

        let cache = tmp.path().join("_inv/sample_objects.json");

        let sync = Synchronizer::new(
            Box::new(FakeFetcher::new(responses.clone())),
            false,
        );
        sync.sync(&config, tmp.path()).await.unwrap();
        let first = std::fs::read(&cache).unwrap();

        let sync = Synchronizer::new(Box::new(FakeFetcher::new(responses)), false);
        sync.sync(&config, tmp.path()).await.unwrap();
        let second = std::fs::read(&cache).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_self_reference_never_fetched() {
        let tmp = TempDir::new().unwrap();
        let config = config_yaml("interlinks:\n  sources:\n    myself:\n      url: /\n");

        let fetcher = Box::new(FakeFetcher::new(HashMap::new()));
        let sync = Synchronizer::new(fetcher, false);
        let report = sync.sync(&config, tmp.path()).await.unwrap();

        assert_eq!(report.skipped, ["myself"]);
        assert!(report.written.is_empty());
        assert!(report.failed.is_empty());
        assert!(!tmp.path().join("_inv/myself_objects.json").exists());
        assert!(!tmp.path().join("_inv").exists());
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let tmp = TempDir::new().unwrap();
        let config = config_yaml(
            "interlinks:\n  sources:\n    alpha:\n      url: https://a.example.org/\n    \
             bravo:\n      url: https://b.example.org/\n    \
             charlie:\n      url: https://c.example.org/\n",
        );

        let inv = encode_inventory("pkg.run py:function 1 run.html -\n");
        let mut responses = HashMap::new();
        responses.insert("https://a.example.org/objects.inv".to_string(), inv.clone());
        responses.insert("https://c.example.org/objects.inv".to_string(), inv);
        // bravo is absent: its fetch fails.

        let sync = Synchronizer::new(Box::new(FakeFetcher::new(responses)), false);
        let report = sync.sync(&config, tmp.path()).await.unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failed, ["bravo"]);
        assert!(tmp.path().join("_inv/alpha_objects.json").exists());
        assert!(!tmp.path().join("_inv/bravo_objects.json").exists());
        assert!(tmp.path().join("_inv/charlie_objects.json").exists());
    }

    #[tokio::test]
    async fn test_missing_interlinks_block() {
        let tmp = TempDir::new().unwrap();
        let config = QuartoConfig::default();

        let sync = Synchronizer::new(Box::new(FakeFetcher::new(HashMap::new())), false);
        let err = sync.sync(&config, tmp.path()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Interlinks(InterlinksError::ConfigMissing)
        ));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = config_yaml(
            "interlinks:\n  sources:\n    sample:\n      url: https://example.org/\n",
        );

        let mut responses = HashMap::new();
        responses.insert(
            "https://example.org/objects.inv".to_string(),
            encode_inventory("sample.run py:function 1 api.html#$ -\n"),
        );

        let sync = Synchronizer::new(Box::new(FakeFetcher::new(responses)), true);
        let report = sync.sync(&config, tmp.path()).await.unwrap();

        assert_eq!(report.written.len(), 1);
        assert!(!tmp.path().join("_inv").exists());
    }

    #[tokio::test]
    async fn test_invalid_payload_is_per_source_failure() {
        let tmp = TempDir::new().unwrap();
        let config = config_yaml(
            "interlinks:\n  sources:\n    sample:\n      url: https://example.org/\n",
        );

        let mut responses = HashMap::new();
        responses.insert(
            "https://example.org/objects.inv".to_string(),
            b"<html>404</html>".to_vec(),
        );

        let sync = Synchronizer::new(Box::new(FakeFetcher::new(responses)), false);
        let report = sync.sync(&config, tmp.path()).await.unwrap();

        assert!(report.written.is_empty());
        assert_eq!(report.failed, ["sample"]);
    }
}
