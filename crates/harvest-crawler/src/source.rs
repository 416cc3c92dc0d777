//! Document source strategies for the crawler
//!
//! Implements the DocumentSource strategy trait:
//! - `LocalFsSource`: walks a local directory tree
//! - `HttpSource`: fetches a configured list of URLs
//!
//! FTP, SSH and S3 backends plug in at the same trait boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harvest_core::config::{HttpSourceConfig, LocalSourceConfig};
use harvest_core::prelude::*;
use harvest_core::DocumentStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use walkdir::WalkDir;

// ============================================================================
// Local Filesystem Source
// ============================================================================

/// A file discovered during the walk, before its contents are read
#[derive(Debug, Clone)]
struct FileEntry {
    path: PathBuf,
    id: String,
    filename: String,
    modified: Option<DateTime<Utc>>,
}

/// Local filesystem document source
///
/// Walks the configured root once per `documents()` call. The walk itself
/// runs on a blocking thread; file contents are read asynchronously as the
/// stream is consumed. Unreadable files surface as `Err` items and the
/// stream continues past them.
pub struct LocalFsSource {
    config: LocalSourceConfig,
    running: AtomicBool,
}

impl LocalFsSource {
    /// Create a new local filesystem source
    pub fn new(config: LocalSourceConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Walk the root and collect matching files
    fn walk(config: &LocalSourceConfig) -> Vec<FileEntry> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(&config.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = match entry.path().strip_prefix(&config.root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let id = relative.to_string_lossy().replace('\\', "/");

            if !config.include_hidden && is_hidden(relative) {
                continue;
            }
            if config.excludes.iter().any(|ex| id.contains(ex.as_str())) {
                debug!(path = %id, "Excluded by pattern");
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %id, error = %e, "Skipping file without metadata");
                    continue;
                }
            };
            if config.max_file_size > 0 && metadata.len() > config.max_file_size {
                debug!(
                    path = %id,
                    size = metadata.len(),
                    limit = config.max_file_size,
                    "Skipping oversized file"
                );
                continue;
            }

            let filename = entry.file_name().to_string_lossy().into_owned();
            let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

            entries.push(FileEntry {
                path: entry.path().to_path_buf(),
                id,
                filename,
                modified,
            });
        }

        entries
    }
}

/// Check if any path component is hidden (dot-prefixed)
fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

#[async_trait]
impl Lifecycle for LocalFsSource {
    async fn start(&self) -> Result<()> {
        if !self.config.root.is_dir() {
            return Err(HarvestError::crawl(format!(
                "Root is not a directory: {}",
                self.config.root.display()
            )));
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthCheck for LocalFsSource {
    async fn health_check(&self) -> Result<()> {
        if self.config.root.is_dir() {
            Ok(())
        } else {
            Err(HarvestError::crawl(format!(
                "Root is not a directory: {}",
                self.config.root.display()
            )))
        }
    }

    fn component_name(&self) -> &'static str {
        "local_fs_source"
    }
}

#[async_trait]
impl DocumentSource for LocalFsSource {
    async fn documents(&self) -> Result<DocumentStream> {
        let config = self.config.clone();
        let source_name = self.config.name.clone();

        let entries = tokio::task::spawn_blocking(move || Self::walk(&config))
            .await
            .map_err(|e| HarvestError::Internal(format!("Walk task failed: {e}")))?;

        debug!(source = %source_name, files = entries.len(), "Walk complete");

        let stream = async_stream::stream! {
            for entry in entries {
                match tokio::fs::read(&entry.path).await {
                    Ok(data) => {
                        let mut doc = RawDocument::new(
                            entry.id,
                            source_name.clone(),
                            entry.filename,
                            data,
                        );
                        if let Some(modified) = entry.modified {
                            doc = doc.with_modified(modified);
                        }
                        yield Ok(doc);
                    }
                    Err(e) => {
                        yield Err(HarvestError::crawl_with_source(
                            format!("Failed to read {}", entry.path.display()),
                            e,
                        ));
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

// ============================================================================
// HTTP Source
// ============================================================================

/// HTTP document source
///
/// Fetches each configured URL once. The document id is the URL itself; the
/// filename is the last path segment.
pub struct HttpSource {
    config: HttpSourceConfig,
    client: reqwest::Client,
    running: AtomicBool,
}

impl HttpSource {
    /// Create a new HTTP source
    pub fn new(config: HttpSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HarvestError::crawl_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            config,
            client,
            running: AtomicBool::new(false),
        })
    }

    /// Last path segment of a URL, for file attribution
    fn filename_of(url: &url::Url) -> String {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("index")
            .to_string()
    }
}

#[async_trait]
impl Lifecycle for HttpSource {
    async fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthCheck for HttpSource {
    async fn health_check(&self) -> Result<()> {
        for raw in &self.config.urls {
            url::Url::parse(raw)
                .map_err(|e| HarvestError::crawl_with_source(format!("Invalid URL {raw}"), e))?;
        }
        Ok(())
    }

    fn component_name(&self) -> &'static str {
        "http_source"
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn documents(&self) -> Result<DocumentStream> {
        let client = self.client.clone();
        let source_name = self.config.name.clone();
        let urls = self.config.urls.clone();

        let stream = async_stream::stream! {
            for raw in urls {
                let url = match url::Url::parse(&raw) {
                    Ok(url) => url,
                    Err(e) => {
                        yield Err(HarvestError::crawl_with_source(
                            format!("Invalid URL {raw}"),
                            e,
                        ));
                        continue;
                    }
                };

                let response = match client.get(url.clone()).send().await {
                    Ok(response) if response.status().is_success() => response,
                    Ok(response) => {
                        yield Err(HarvestError::crawl(format!(
                            "GET {raw} returned {}",
                            response.status()
                        )));
                        continue;
                    }
                    Err(e) => {
                        yield Err(HarvestError::crawl_with_source(
                            format!("GET {raw} failed"),
                            e,
                        ));
                        continue;
                    }
                };

                match response.bytes().await {
                    Ok(data) => {
                        yield Ok(RawDocument::new(
                            raw.clone(),
                            source_name.clone(),
                            Self::filename_of(&url),
                            data,
                        ));
                    }
                    Err(e) => {
                        yield Err(HarvestError::crawl_with_source(
                            format!("Failed to read body of {raw}"),
                            e,
                        ));
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::fs;
    use tempfile::tempdir;

    fn local_config(root: &Path) -> LocalSourceConfig {
        LocalSourceConfig {
            name: "test".to_string(),
            root: root.to_path_buf(),
            excludes: Vec::new(),
            include_hidden: false,
            max_file_size: 0,
        }
    }

    async fn collect_ids(source: &LocalFsSource) -> Vec<String> {
        let mut stream = source.documents().await.unwrap();
        let mut ids = Vec::new();
        while let Some(result) = stream.next().await {
            ids.push(result.unwrap().id);
        }
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_walk_yields_files_recursively() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.md"), "beta").unwrap();

        let source = LocalFsSource::new(local_config(dir.path()));
        source.start().await.unwrap();

        let ids = collect_ids(&source).await;
        assert_eq!(ids, vec!["a.txt", "sub/b.md"]);
    }

    #[tokio::test]
    async fn test_hidden_files_skipped_unless_configured() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("visible.txt"), "v").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "g").unwrap();
        fs::write(dir.path().join(".env"), "e").unwrap();

        let source = LocalFsSource::new(local_config(dir.path()));
        assert_eq!(collect_ids(&source).await, vec!["visible.txt"]);

        let mut config = local_config(dir.path());
        config.include_hidden = true;
        let source = LocalFsSource::new(config);
        assert_eq!(
            collect_ids(&source).await,
            vec![".env", ".git/config", "visible.txt"]
        );
    }

    #[tokio::test]
    async fn test_excludes_and_size_limit() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "k").unwrap();
        fs::write(dir.path().join("skip.log"), "s").unwrap();
        fs::write(dir.path().join("huge.bin"), vec![0u8; 2048]).unwrap();

        let mut config = local_config(dir.path());
        config.excludes = vec![".log".to_string()];
        config.max_file_size = 1024;

        let source = LocalFsSource::new(config);
        assert_eq!(collect_ids(&source).await, vec!["keep.txt"]);
    }

    #[tokio::test]
    async fn test_document_carries_contents_and_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.txt"), "document body").unwrap();

        let source = LocalFsSource::new(local_config(dir.path()));
        let mut stream = source.documents().await.unwrap();
        let doc = stream.next().await.unwrap().unwrap();

        assert_eq!(doc.id, "doc.txt");
        assert_eq!(doc.filename, "doc.txt");
        assert_eq!(doc.source_name, "test");
        assert_eq!(&doc.data[..], b"document body");
        assert!(doc.modified.is_some());
    }

    #[tokio::test]
    async fn test_start_rejects_missing_root() {
        let source = LocalFsSource::new(local_config(Path::new("/nonexistent/harvest-root")));
        assert!(source.start().await.is_err());
    }

    #[test]
    fn test_http_filename_extraction() {
        let url = url::Url::parse("https://example.com/files/report.pdf").unwrap();
        assert_eq!(HttpSource::filename_of(&url), "report.pdf");

        let bare = url::Url::parse("https://example.com/").unwrap();
        assert_eq!(HttpSource::filename_of(&bare), "index");
    }

    #[tokio::test]
    async fn test_http_health_check_validates_urls() {
        let source = HttpSource::new(HttpSourceConfig {
            name: "http".to_string(),
            urls: vec!["not a url".to_string()],
            request_timeout: std::time::Duration::from_secs(5),
        })
        .unwrap();

        assert!(source.health_check().await.is_err());
    }
}
