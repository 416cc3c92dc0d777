//! Harvest Crawler CLI
//!
//! Crawls configured document sources and bulk-indexes extracted content
//! into Elasticsearch.

use clap::Parser;
use harvest_core::config::{HarvestConfig, LocalSourceConfig, SourceConfig};
use harvest_core::prelude::*;
use harvest_crawler::{Crawler, HttpSource, LocalFsSource, PlainTextExtractor, TikaExtractor};
use harvest_indexer::{BulkProcessor, EsBulkEngine, LoggingListener};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "harvest-crawler")]
#[command(about = "Document crawler and bulk indexer for doc-harvest")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "HARVEST_CONFIG")]
    config: Option<String>,

    /// Crawl this directory (in addition to configured sources)
    #[arg(long, env = "HARVEST_ROOT")]
    root: Option<PathBuf>,

    /// Elasticsearch hosts (comma-separated, overrides config)
    #[arg(long, env = "ES_HOSTS")]
    es_hosts: Option<String>,

    /// Target index name (overrides config)
    #[arg(long, env = "HARVEST_INDEX")]
    index: Option<String>,

    /// Log level (overrides config)
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = HarvestConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    init_tracing(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting harvest-crawler");

    if config.crawler.sources.is_empty() {
        warn!("No sources configured, nothing to crawl");
        return Ok(());
    }

    // Backend engine and shared bulk processor
    let engine = EsBulkEngine::new(config.indexer.elasticsearch.clone())?;
    engine.health_check().await?;

    let bulk = &config.indexer.bulk;
    let processor = Arc::new(
        BulkProcessor::builder(engine)
            .listener(LoggingListener::new("indexer"))
            .max_actions(bulk.max_actions)
            .max_bytes(bulk.max_bytes)
            .flush_interval(bulk.flush_interval)
            .build(),
    );

    let extractor: Arc<dyn ContentExtractor> = match config.crawler.extractor.kind.as_str() {
        "tika" => Arc::new(TikaExtractor::new(&config.crawler.extractor)?),
        "plain" => Arc::new(PlainTextExtractor),
        other => {
            return Err(HarvestError::config(format!("Unknown extractor kind: {other}")).into())
        }
    };

    let mut outcome = Ok(());
    for source_config in &config.crawler.sources {
        let result = match source_config {
            SourceConfig::Local(local) => {
                let crawler = Crawler::new(
                    LocalFsSource::new(local.clone()),
                    Arc::clone(&extractor),
                    Arc::clone(&processor),
                    config.crawler.index.clone(),
                );
                crawler.run().await
            }
            SourceConfig::Http(http) => {
                let crawler = Crawler::new(
                    HttpSource::new(http.clone())?,
                    Arc::clone(&extractor),
                    Arc::clone(&processor),
                    config.crawler.index.clone(),
                );
                crawler.run().await
            }
        };

        match result {
            Ok(()) => {}
            Err(HarvestError::Shutdown) => {
                info!("Interrupted, flushing pending operations");
                break;
            }
            Err(e) => {
                error!(error = %e, "Crawl failed");
                outcome = Err(e);
                break;
            }
        }
    }

    // Drain whatever is still batched before reporting the outcome
    processor.close().await?;

    outcome?;
    info!("harvest-crawler stopped gracefully");
    Ok(())
}

/// Fold CLI arguments into the loaded configuration
fn apply_overrides(config: &mut HarvestConfig, args: &Args) {
    if let Some(ref root) = args.root {
        config.crawler.sources.push(SourceConfig::Local(LocalSourceConfig {
            name: "cli".to_string(),
            root: root.clone(),
            excludes: Vec::new(),
            include_hidden: false,
            max_file_size: 20 * 1024 * 1024,
        }));
    }

    if let Some(ref hosts) = args.es_hosts {
        config.indexer.elasticsearch.hosts =
            hosts.split(',').map(|s| s.trim().to_string()).collect();
    }

    if let Some(ref index) = args.index {
        config.crawler.index = index.clone();
    }

    if let Some(ref level) = args.log_level {
        config.observability.log_level = level.clone();
    }
}

/// Initialize the tracing subscriber from configuration
fn init_tracing(config: &HarvestConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.log_format == "pretty" {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }
}
