//! Bulk lifecycle listener
//!
//! The listener brackets every batch transmission. It is the only place
//! engine failures surface; the processor never propagates them to the
//! caller that triggered the flush.

use crate::batch::OperationBatch;
use harvest_core::metrics::IndexerMetrics;
use harvest_core::prelude::*;
use tracing::{debug, error, warn};

/// Callback contract notified before and after each batch transmission.
///
/// All calls happen on whichever task performs the flush. For a given
/// execution id, `before_bulk` always precedes the corresponding
/// `after_bulk`/`after_bulk_failure`; across ids the only guarantee is that
/// ids are assigned in dispatch order.
pub trait BulkListener: Send + Sync {
    /// Invoked immediately before the engine transmits `batch`
    fn before_bulk(&self, execution_id: u64, batch: &OperationBatch);

    /// Invoked after a successful engine call
    fn after_bulk(&self, execution_id: u64, batch: &OperationBatch, response: &BulkResponse);

    /// Invoked when the engine call fails
    ///
    /// This is the only failure surfacing mechanism: the batch's operations
    /// are dropped, not requeued.
    fn after_bulk_failure(&self, execution_id: u64, batch: &OperationBatch, error: &HarvestError);
}

/// Listener that ignores every notification
///
/// Default for processors built without an explicit listener.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl BulkListener for NoopListener {
    fn before_bulk(&self, _execution_id: u64, _batch: &OperationBatch) {}

    fn after_bulk(&self, _execution_id: u64, _batch: &OperationBatch, _response: &BulkResponse) {}

    fn after_bulk_failure(
        &self,
        _execution_id: u64,
        _batch: &OperationBatch,
        _error: &HarvestError,
    ) {
    }
}

/// Listener that logs each flush and records indexer metrics
pub struct LoggingListener {
    metrics: IndexerMetrics,
}

impl LoggingListener {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            metrics: IndexerMetrics::new(component),
        }
    }
}

impl BulkListener for LoggingListener {
    fn before_bulk(&self, execution_id: u64, batch: &OperationBatch) {
        debug!(
            execution_id,
            actions = batch.len(),
            bytes = batch.total_bytes(),
            "Executing bulk request"
        );
        self.metrics.record_batch_bytes(batch.total_bytes());
    }

    fn after_bulk(&self, execution_id: u64, batch: &OperationBatch, response: &BulkResponse) {
        self.metrics.record_bulk_request("ok");
        self.metrics.record_docs_indexed(response.success_count as u64);
        self.metrics
            .record_bulk_latency(std::time::Duration::from_millis(response.duration_ms));

        if response.is_complete_success() {
            debug!(
                execution_id,
                actions = batch.len(),
                duration_ms = response.duration_ms,
                "Bulk request completed"
            );
        } else {
            self.metrics
                .record_docs_failed(response.failure_count as u64, "bulk_rejected");
            for (doc_id, reason) in &response.failures {
                warn!(execution_id, doc_id, reason, "Document rejected by backend");
            }
        }
    }

    fn after_bulk_failure(&self, execution_id: u64, batch: &OperationBatch, error: &HarvestError) {
        self.metrics.record_bulk_request("error");
        self.metrics
            .record_docs_failed(batch.len() as u64, "bulk_error");
        error!(
            execution_id,
            actions = batch.len(),
            error = %error,
            "Bulk request failed, dropping batch"
        );
    }
}
