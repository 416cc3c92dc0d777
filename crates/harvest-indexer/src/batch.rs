//! Bulk request accumulator
//!
//! An `OperationBatch` collects operations in insertion order, tracks their
//! cumulative byte estimate, and answers the threshold question the processor
//! asks after every append.

use harvest_core::prelude::*;

/// A growable, size-tracking collection of operations with optional
/// count/byte thresholds.
///
/// A threshold of zero disables that limit. With both disabled the batch is
/// unbounded and only time-based flushing or `close()` will ever drain it.
#[derive(Debug, Default)]
pub struct OperationBatch {
    operations: Vec<DocOperation>,
    total_bytes: u64,
    max_actions: usize,
    max_bytes: u64,
}

impl OperationBatch {
    /// Create an empty, unbounded batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the operation-count threshold (0 disables)
    pub fn max_actions(mut self, max_actions: usize) -> Self {
        self.max_actions = max_actions;
        self
    }

    /// Builder: set the byte threshold (0 disables)
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Create an empty batch inheriting this batch's thresholds
    pub fn fresh(&self) -> Self {
        Self {
            operations: Vec::new(),
            total_bytes: 0,
            max_actions: self.max_actions,
            max_bytes: self.max_bytes,
        }
    }

    /// Append an operation; always succeeds
    pub fn add(&mut self, operation: DocOperation) {
        self.total_bytes += operation.size_estimate();
        self.operations.push(operation);
    }

    /// Number of operations in the batch
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Sum of the operations' size estimates
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Check whether any enabled threshold has been reached
    ///
    /// Boundaries are inclusive: a batch with `max_actions = 5` is over-limit
    /// exactly when its 5th operation has been added.
    pub fn is_over_limit(&self) -> bool {
        let over_actions = self.max_actions > 0 && self.operations.len() >= self.max_actions;
        let over_bytes = self.max_bytes > 0 && self.total_bytes >= self.max_bytes;
        over_actions || over_bytes
    }

    /// Operations in insertion order
    pub fn operations(&self) -> &[DocOperation] {
        &self.operations
    }
}

impl IntoIterator for OperationBatch {
    type Item = DocOperation;
    type IntoIter = std::vec::IntoIter<DocOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(id: &str) -> DocOperation {
        DocOperation::index("docs", id, json!({"content": "payload"}))
    }

    #[test]
    fn test_count_threshold_boundary_inclusive() {
        let mut batch = OperationBatch::new().max_actions(5);

        for i in 0..4 {
            batch.add(op(&format!("doc-{i}")));
            assert!(!batch.is_over_limit(), "under limit after {} adds", i + 1);
        }

        batch.add(op("doc-4"));
        assert!(batch.is_over_limit());
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn test_byte_threshold_boundary_inclusive() {
        let unit = op("doc-0").size_estimate();
        let mut batch = OperationBatch::new().max_bytes(3 * unit);

        batch.add(op("doc-0"));
        batch.add(op("doc-1"));
        assert!(!batch.is_over_limit());

        // Total meets the threshold exactly
        batch.add(op("doc-2"));
        assert_eq!(batch.total_bytes(), 3 * unit);
        assert!(batch.is_over_limit());
    }

    #[test]
    fn test_zero_disables_thresholds() {
        let mut batch = OperationBatch::new().max_actions(0).max_bytes(0);
        for i in 0..10_000 {
            batch.add(DocOperation::delete("docs", format!("doc-{i}")));
        }
        assert!(!batch.is_over_limit());
    }

    #[test]
    fn test_total_bytes_is_sum_of_estimates() {
        let mut batch = OperationBatch::new();
        let a = op("a");
        let b = DocOperation::delete("docs", "b");
        let expected = a.size_estimate() + b.size_estimate();

        batch.add(a);
        batch.add(b);
        assert_eq!(batch.total_bytes(), expected);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut batch = OperationBatch::new();
        for i in 0..5 {
            batch.add(op(&format!("doc-{i}")));
        }
        let ids: Vec<&str> = batch.operations().iter().map(|o| o.doc_id()).collect();
        assert_eq!(ids, vec!["doc-0", "doc-1", "doc-2", "doc-3", "doc-4"]);
    }
}
