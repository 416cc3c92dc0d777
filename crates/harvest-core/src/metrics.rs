//! Metrics for doc-harvest
//!
//! Provides Prometheus-compatible metrics for observability.

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Metric names as constants for consistency
pub mod names {
    // Crawler metrics
    pub const CRAWLER_DOCS_TOTAL: &str = "harvest_crawler_docs_total";
    pub const CRAWLER_ERRORS_TOTAL: &str = "harvest_crawler_errors_total";
    pub const CRAWLER_EXTRACT_LATENCY: &str = "harvest_crawler_extract_latency_seconds";

    // Indexer metrics
    pub const INDEXER_BULK_REQUESTS: &str = "harvest_indexer_bulk_requests_total";
    pub const INDEXER_DOCS_INDEXED: &str = "harvest_indexer_docs_indexed_total";
    pub const INDEXER_DOCS_FAILED: &str = "harvest_indexer_docs_failed_total";
    pub const INDEXER_BULK_LATENCY: &str = "harvest_indexer_bulk_latency_seconds";
    pub const INDEXER_BATCH_BYTES: &str = "harvest_indexer_batch_bytes";
}

/// Labels for metrics
pub mod labels {
    pub const COMPONENT: &str = "component";
    pub const SOURCE: &str = "source";
    pub const ERROR_TYPE: &str = "error_type";
    pub const STATUS: &str = "status";
}

/// Crawler metrics
#[derive(Clone)]
pub struct CrawlerMetrics {
    component: String,
}

impl CrawlerMetrics {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Record a crawled document
    pub fn record_document(&self, source: &str) {
        counter!(
            names::CRAWLER_DOCS_TOTAL,
            labels::COMPONENT => self.component.clone(),
            labels::SOURCE => source.to_string(),
        )
        .increment(1);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        counter!(
            names::CRAWLER_ERRORS_TOTAL,
            labels::COMPONENT => self.component.clone(),
            labels::ERROR_TYPE => error_type.to_string(),
        )
        .increment(1);
    }

    /// Record extraction latency
    pub fn record_extract_latency(&self, duration: Duration) {
        histogram!(
            names::CRAWLER_EXTRACT_LATENCY,
            labels::COMPONENT => self.component.clone(),
        )
        .record(duration.as_secs_f64());
    }
}

/// Indexer metrics
#[derive(Clone)]
pub struct IndexerMetrics {
    component: String,
}

impl IndexerMetrics {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Record a bulk request outcome
    pub fn record_bulk_request(&self, status: &str) {
        counter!(
            names::INDEXER_BULK_REQUESTS,
            labels::COMPONENT => self.component.clone(),
            labels::STATUS => status.to_string(),
        )
        .increment(1);
    }

    /// Record documents accepted by the backend
    pub fn record_docs_indexed(&self, count: u64) {
        counter!(
            names::INDEXER_DOCS_INDEXED,
            labels::COMPONENT => self.component.clone(),
        )
        .increment(count);
    }

    /// Record documents rejected or dropped
    pub fn record_docs_failed(&self, count: u64, error_type: &str) {
        counter!(
            names::INDEXER_DOCS_FAILED,
            labels::COMPONENT => self.component.clone(),
            labels::ERROR_TYPE => error_type.to_string(),
        )
        .increment(count);
    }

    /// Record bulk request latency
    pub fn record_bulk_latency(&self, duration: Duration) {
        histogram!(
            names::INDEXER_BULK_LATENCY,
            labels::COMPONENT => self.component.clone(),
        )
        .record(duration.as_secs_f64());
    }

    /// Record the byte size of a dispatched batch
    pub fn record_batch_bytes(&self, bytes: u64) {
        gauge!(
            names::INDEXER_BATCH_BYTES,
            labels::COMPONENT => self.component.clone(),
        )
        .set(bytes as f64);
    }
}

/// Timer guard for automatic latency recording
pub struct LatencyTimer<F>
where
    F: FnOnce(Duration),
{
    start: Instant,
    on_drop: Option<F>,
}

impl<F> LatencyTimer<F>
where
    F: FnOnce(Duration),
{
    /// Start a new timer
    pub fn start(on_drop: F) -> Self {
        Self {
            start: Instant::now(),
            on_drop: Some(on_drop),
        }
    }

    /// Get elapsed time without stopping
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop timer and record
    pub fn stop(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if let Some(f) = self.on_drop.take() {
            f(elapsed);
        }
        elapsed
    }
}

impl<F> Drop for LatencyTimer<F>
where
    F: FnOnce(Duration),
{
    fn drop(&mut self) {
        if let Some(f) = self.on_drop.take() {
            f(self.start.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_timer() {
        let mut recorded = None;
        {
            let timer = LatencyTimer::start(|d| recorded = Some(d));
            std::thread::sleep(Duration::from_millis(10));
            timer.stop();
        }
        assert!(recorded.is_some());
        assert!(recorded.unwrap() >= Duration::from_millis(10));
    }
}
