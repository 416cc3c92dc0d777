//! # Harvest Crawler
//!
//! Crawls documents from heterogeneous sources, extracts their content, and
//! feeds index operations to the bulk processor.
//!
//! ## Strategies
//!
//! - `LocalFsSource`: walks a local directory tree
//! - `HttpSource`: fetches a configured list of URLs
//! - `TikaExtractor` / `PlainTextExtractor`: content extraction
//!
//! ## Usage
//!
//! ```rust,ignore
//! let source = LocalFsSource::new(source_config);
//! let crawler = Crawler::new(source, extractor, processor, "documents");
//! crawler.run().await?;
//! ```

pub mod extract;
pub mod source;

pub use extract::*;
pub use source::*;

use futures::StreamExt;
use harvest_core::metrics::{CrawlerMetrics, LatencyTimer};
use harvest_core::prelude::*;
use harvest_indexer::{BulkListener, BulkProcessor};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Crawl orchestrator for a single document source
///
/// Streams documents, extracts content, and appends one index operation per
/// document to the shared bulk processor. Retryable per-document failures
/// are logged and skipped; anything else aborts the crawl.
pub struct Crawler<S, E, L>
where
    S: DocumentSource,
    E: BulkEngine + 'static,
    L: BulkListener + 'static,
{
    source: Arc<S>,
    extractor: Arc<dyn ContentExtractor>,
    processor: Arc<BulkProcessor<E, L>>,
    index: String,
    crawl_id: Uuid,
    metrics: CrawlerMetrics,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl<S, E, L> Crawler<S, E, L>
where
    S: DocumentSource + 'static,
    E: BulkEngine + 'static,
    L: BulkListener + 'static,
{
    /// Create a new crawler
    pub fn new(
        source: S,
        extractor: Arc<dyn ContentExtractor>,
        processor: Arc<BulkProcessor<E, L>>,
        index: impl Into<String>,
    ) -> Self {
        Self {
            source: Arc::new(source),
            extractor,
            processor,
            index: index.into(),
            crawl_id: Uuid::now_v7(),
            metrics: CrawlerMetrics::new("crawler"),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Run the crawl to completion
    ///
    /// Returns `HarvestError::Shutdown` if interrupted by ctrl-c, so callers
    /// can distinguish an aborted run from a finished one.
    pub async fn run(&self) -> Result<()> {
        info!(
            crawl_id = %self.crawl_id,
            source = self.source.name(),
            extractor = self.extractor.name(),
            index = %self.index,
            "Starting crawl"
        );

        self.source.start().await?;
        let mut stream = self.source.documents().await?;

        loop {
            tokio::select! {
                maybe = stream.next() => {
                    match maybe {
                        Some(Ok(raw)) => {
                            let doc_id = raw.id.clone();
                            if let Err(e) = self.process_document(raw).await {
                                if e.is_retryable() {
                                    warn!(doc = %doc_id, error = %e, "Skipping document");
                                    self.metrics.record_error("document_failed");
                                    self.failed.fetch_add(1, Ordering::Relaxed);
                                } else {
                                    error!(doc = %doc_id, error = %e, "Aborting crawl");
                                    self.source.stop().await?;
                                    return Err(e);
                                }
                            }
                        }
                        Some(Err(e)) if e.is_retryable() => {
                            warn!(error = %e, "Skipping unreadable document");
                            self.metrics.record_error("read_failed");
                            self.failed.fetch_add(1, Ordering::Relaxed);
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Aborting crawl");
                            self.source.stop().await?;
                            return Err(e);
                        }
                        None => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!(crawl_id = %self.crawl_id, "Shutdown signal received");
                    self.source.stop().await?;
                    return Err(HarvestError::Shutdown);
                }
            }
        }

        self.source.stop().await?;

        info!(
            crawl_id = %self.crawl_id,
            source = self.source.name(),
            processed = self.processed.load(Ordering::Relaxed),
            failed = self.failed.load(Ordering::Relaxed),
            "Crawl finished"
        );
        Ok(())
    }

    /// Extract one document and hand its index operation to the processor
    async fn process_document(&self, raw: RawDocument) -> Result<()> {
        let extracted = {
            let _timer = LatencyTimer::start(|d| self.metrics.record_extract_latency(d));
            self.extractor.extract(&raw).await?
        };

        let source = extracted.to_source(&raw);
        let operation = DocOperation::index(&self.index, &raw.id, source);
        self.processor.add(operation).await?;

        self.metrics.record_document(self.source.name());
        self.processed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Get processed count
    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Get failed count
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use harvest_core::config::LocalSourceConfig;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Engine double that collects every operation it receives
    #[derive(Clone, Default)]
    struct CollectingEngine {
        batches: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl CollectingEngine {
        fn batches(&self) -> Vec<Vec<String>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BulkEngine for CollectingEngine {
        async fn execute(&self, batch: &[DocOperation]) -> Result<BulkResponse> {
            let ids = batch.iter().map(|o| o.doc_id().to_string()).collect();
            self.batches.lock().unwrap().push(ids);
            Ok(BulkResponse::success(batch.len(), 1))
        }
    }

    /// Extractor double that fails for one specific filename
    struct SelectiveExtractor {
        poison: &'static str,
    }

    #[async_trait]
    impl ContentExtractor for SelectiveExtractor {
        async fn extract(&self, raw: &RawDocument) -> Result<ExtractedDocument> {
            if raw.filename == self.poison {
                return Err(HarvestError::extraction("unsupported format"));
            }
            PlainTextExtractor.extract(raw).await
        }

        fn name(&self) -> &'static str {
            "selective"
        }
    }

    fn local_source(root: &std::path::Path) -> LocalFsSource {
        LocalFsSource::new(LocalSourceConfig {
            name: "test".to_string(),
            root: root.to_path_buf(),
            excludes: Vec::new(),
            include_hidden: false,
            max_file_size: 0,
        })
    }

    #[tokio::test]
    async fn test_crawl_indexes_every_document() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.txt"), "beta").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.txt"), "gamma").unwrap();

        let engine = CollectingEngine::default();
        let processor = Arc::new(BulkProcessor::builder(engine.clone()).build());
        let crawler = Crawler::new(
            local_source(dir.path()),
            Arc::new(PlainTextExtractor),
            Arc::clone(&processor),
            "documents",
        );

        crawler.run().await.unwrap();
        processor.close().await.unwrap();

        assert_eq!(crawler.processed_count(), 3);
        assert_eq!(crawler.failed_count(), 0);

        let batches = engine.batches();
        assert_eq!(batches.len(), 1, "unbounded batch drains once on close");
        let mut ids = batches[0].clone();
        ids.sort();
        assert_eq!(ids, vec!["a.txt", "b.txt", "sub/c.txt"]);
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_document() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.txt"), "fine").unwrap();
        fs::write(dir.path().join("bad.bin"), "broken").unwrap();

        let engine = CollectingEngine::default();
        let processor = Arc::new(BulkProcessor::builder(engine.clone()).build());
        let crawler = Crawler::new(
            local_source(dir.path()),
            Arc::new(SelectiveExtractor { poison: "bad.bin" }),
            Arc::clone(&processor),
            "documents",
        );

        crawler.run().await.unwrap();
        processor.close().await.unwrap();

        assert_eq!(crawler.processed_count(), 1);
        assert_eq!(crawler.failed_count(), 1);
        assert_eq!(engine.batches(), vec![vec!["good.txt".to_string()]]);
    }

    #[tokio::test]
    async fn test_closed_processor_aborts_crawl() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();

        let engine = CollectingEngine::default();
        let processor = Arc::new(BulkProcessor::builder(engine.clone()).build());
        processor.close().await.unwrap();

        let crawler = Crawler::new(
            local_source(dir.path()),
            Arc::new(PlainTextExtractor),
            Arc::clone(&processor),
            "documents",
        );

        let result = crawler.run().await;
        assert!(matches!(result, Err(HarvestError::ProcessorClosed)));
    }
}
