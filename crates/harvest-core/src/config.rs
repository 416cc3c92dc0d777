//! Configuration types for doc-harvest
//!
//! Uses the `config` crate for layered configuration from files and
//! environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the entire harvester
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Crawler (source + extraction) configuration
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Indexer (bulk + backend) configuration
    #[serde(default)]
    pub indexer: IndexerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================================================
// Crawler Configuration
// ============================================================================

/// Crawler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Document sources to crawl, in order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Content extraction configuration
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Target index name
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_index() -> String {
    "documents".to_string()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            extractor: ExtractorConfig::default(),
            index: default_index(),
        }
    }
}

/// A single document source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Local filesystem directory
    Local(LocalSourceConfig),
    /// Fixed list of HTTP(S) URLs
    Http(HttpSourceConfig),
}

/// Local filesystem source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSourceConfig {
    /// Source name, used for document attribution
    #[serde(default = "default_local_name")]
    pub name: String,

    /// Root directory to walk
    pub root: PathBuf,

    /// Path substrings to exclude
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Include hidden files and directories
    #[serde(default)]
    pub include_hidden: bool,

    /// Skip files larger than this many bytes (0 = no limit)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_local_name() -> String {
    "local".to_string()
}

fn default_max_file_size() -> u64 {
    20 * 1024 * 1024 // 20MB
}

/// HTTP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Source name, used for document attribution
    #[serde(default = "default_http_name")]
    pub name: String,

    /// URLs to fetch
    #[serde(default)]
    pub urls: Vec<String>,

    /// Request timeout
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_http_name() -> String {
    "http".to_string()
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Extractor kind: "tika" or "plain"
    #[serde(default = "default_extractor_kind")]
    pub kind: String,

    /// Tika server base URL
    #[serde(default = "default_tika_url")]
    pub tika_url: String,

    /// Extraction request timeout
    #[serde(with = "humantime_serde", default = "default_extract_timeout")]
    pub request_timeout: Duration,
}

fn default_extractor_kind() -> String {
    "plain".to_string()
}

fn default_tika_url() -> String {
    "http://localhost:9998".to_string()
}

fn default_extract_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            kind: default_extractor_kind(),
            tika_url: default_tika_url(),
            request_timeout: default_extract_timeout(),
        }
    }
}

// ============================================================================
// Indexer Configuration
// ============================================================================

/// Indexer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Target Elasticsearch configuration
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Bulk batching configuration
    #[serde(default)]
    pub bulk: BulkConfig,
}

/// Elasticsearch connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch hosts
    #[serde(default = "default_es_hosts")]
    pub hosts: Vec<String>,

    /// Optional username for authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Optional password for authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Optional API key for authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Connection timeout
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Request timeout
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_es_hosts() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            hosts: default_es_hosts(),
            username: None,
            password: None,
            api_key: None,
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Bulk batching configuration
///
/// Each of the three triggers is independent and disabled at zero. With all
/// three disabled the processor only ever flushes on `close()`, which is
/// valid but usually a caller mistake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Maximum operations per bulk request (0 disables the count trigger)
    #[serde(default = "default_bulk_actions")]
    pub max_actions: usize,

    /// Maximum bytes per bulk request (0 disables the size trigger)
    #[serde(default = "default_bulk_bytes")]
    pub max_bytes: u64,

    /// Flush interval (0 disables the time trigger)
    #[serde(with = "humantime_serde", default = "default_bulk_flush_interval")]
    pub flush_interval: Duration,
}

fn default_bulk_actions() -> usize {
    1000
}

fn default_bulk_bytes() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_bulk_flush_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_actions: default_bulk_actions(),
            max_bytes: default_bulk_bytes(),
            flush_interval: default_bulk_flush_interval(),
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl HarvestConfig {
    /// Load configuration from file and environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default values
        builder = builder.add_source(config::Config::try_from(&Self::default())?);

        // Add config file if specified
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Add environment variables with prefix HARVEST_
        builder = builder.add_source(
            config::Environment::with_prefix("HARVEST")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = HarvestConfig::default();
        assert_eq!(cfg.crawler.index, "documents");
        assert_eq!(cfg.indexer.bulk.max_actions, 1000);
        assert_eq!(cfg.indexer.bulk.flush_interval, Duration::from_secs(5));
        assert_eq!(cfg.indexer.elasticsearch.hosts, vec!["http://localhost:9200"]);
    }

    #[test]
    fn test_zero_disables_triggers() {
        let toml = r#"
            max_actions = 0
            max_bytes = 0
            flush_interval = "0s"
        "#;
        let bulk: BulkConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(bulk.max_actions, 0);
        assert_eq!(bulk.max_bytes, 0);
        assert_eq!(bulk.flush_interval, Duration::ZERO);
    }

    #[test]
    fn test_source_config_tagging() {
        let toml = r#"
            [[sources]]
            type = "local"
            name = "shared"
            root = "/srv/docs"
            excludes = ["tmp/"]

            [[sources]]
            type = "http"
            urls = ["https://example.com/a.pdf"]
        "#;
        let crawler: CrawlerConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(crawler.sources.len(), 2);
        match &crawler.sources[0] {
            SourceConfig::Local(local) => {
                assert_eq!(local.name, "shared");
                assert_eq!(local.root, PathBuf::from("/srv/docs"));
            }
            other => panic!("expected local source, got {:?}", other),
        }
        match &crawler.sources[1] {
            SourceConfig::Http(http) => assert_eq!(http.urls.len(), 1),
            other => panic!("expected http source, got {:?}", other),
        }
    }
}
