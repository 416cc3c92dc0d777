//! Elasticsearch bulk engine
//!
//! Translates a batch of generic operations into an `_bulk` NDJSON request
//! and parses the backend response. This is the only component that performs
//! network I/O on behalf of the bulk processor.
//!
//! Failed batches are dropped and reported through the processor's listener;
//! retry is a policy for the layer above, not this adapter.

use async_trait::async_trait;
use harvest_core::config::ElasticsearchConfig;
use harvest_core::prelude::*;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

/// Elasticsearch `_bulk` API adapter
pub struct EsBulkEngine {
    client: Client,
    config: ElasticsearchConfig,
    host_index: AtomicUsize,
}

impl EsBulkEngine {
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HarvestError::elasticsearch_with_source("Failed to create client", e))?;

        Ok(Self {
            client,
            config,
            host_index: AtomicUsize::new(0),
        })
    }

    /// Get the current host (round-robin for load balancing)
    fn get_host(&self) -> &str {
        let idx = self.host_index.fetch_add(1, Ordering::Relaxed) % self.config.hosts.len();
        &self.config.hosts[idx]
    }

    /// Build request with authentication
    fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.get_host(), path);
        let mut req = self.client.request(method, &url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("ApiKey {}", api_key));
        } else if let (Some(ref user), Some(ref pass)) = (&self.config.username, &self.config.password)
        {
            req = req.basic_auth(user, Some(pass));
        }

        req
    }

    /// Ping the cluster
    pub async fn ping(&self) -> Result<()> {
        let resp = self
            .build_request(reqwest::Method::GET, "/")
            .send()
            .await
            .map_err(|e| HarvestError::elasticsearch_with_source("Ping failed", e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(HarvestError::elasticsearch(format!(
                "Ping returned {}",
                resp.status()
            )))
        }
    }
}

/// Render one operation as its NDJSON bulk line(s)
fn bulk_lines(operation: &DocOperation) -> String {
    let mut lines = String::new();

    match operation.action() {
        DocAction::Index => {
            let action = json!({
                "index": {
                    "_index": operation.index_name(),
                    "_id": operation.doc_id()
                }
            });
            lines.push_str(&serde_json::to_string(&action).unwrap());
            lines.push('\n');

            if let Some(source) = operation.source() {
                lines.push_str(&serde_json::to_string(source).unwrap());
                lines.push('\n');
            }
        }
        DocAction::Delete => {
            let action = json!({
                "delete": {
                    "_index": operation.index_name(),
                    "_id": operation.doc_id()
                }
            });
            lines.push_str(&serde_json::to_string(&action).unwrap());
            lines.push('\n');
        }
    }

    lines
}

/// Parse a `_bulk` response body into a `BulkResponse`
fn parse_bulk_response(body: &Value, batch_len: usize, duration_ms: u64) -> BulkResponse {
    let has_errors = body["errors"].as_bool().unwrap_or(false);
    if !has_errors {
        return BulkResponse::success(batch_len, duration_ms);
    }

    let mut failures = Vec::new();
    if let Some(items) = body["items"].as_array() {
        for item in items {
            let op = item.as_object().and_then(|o| o.values().next());
            if let Some(op) = op {
                if let Some(error) = op.get("error") {
                    let id = op["_id"].as_str().unwrap_or("unknown").to_string();
                    let reason = error["reason"].as_str().unwrap_or("unknown").to_string();
                    failures.push((id, reason));
                }
            }
        }
    }

    BulkResponse {
        success_count: batch_len.saturating_sub(failures.len()),
        failure_count: failures.len(),
        failures,
        duration_ms,
    }
}

#[async_trait]
impl BulkEngine for EsBulkEngine {
    async fn execute(&self, batch: &[DocOperation]) -> Result<BulkResponse> {
        if batch.is_empty() {
            return Ok(BulkResponse::success(0, 0));
        }

        let start = Instant::now();

        let mut body = String::new();
        for operation in batch {
            body.push_str(&bulk_lines(operation));
        }

        let resp = self
            .build_request(reqwest::Method::POST, "/_bulk")
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| HarvestError::elasticsearch_with_source("Bulk request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HarvestError::elasticsearch(format!(
                "Bulk failed: {}",
                status
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| HarvestError::elasticsearch_with_source("Failed to parse response", e))?;

        let result = parse_bulk_response(&body, batch.len(), start.elapsed().as_millis() as u64);

        debug!(
            success = result.success_count,
            failed = result.failure_count,
            duration_ms = result.duration_ms,
            "Bulk request completed"
        );

        Ok(result)
    }
}

#[async_trait]
impl HealthCheck for EsBulkEngine {
    async fn health_check(&self) -> Result<()> {
        self.ping().await
    }

    fn component_name(&self) -> &'static str {
        "es_bulk_engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_operation_renders_two_lines() {
        let op = DocOperation::index("docs", "a.txt", json!({"content": "hello"}));
        let lines = bulk_lines(&op);
        let mut split = lines.lines();

        assert_eq!(
            split.next().unwrap(),
            r#"{"index":{"_id":"a.txt","_index":"docs"}}"#
        );
        assert_eq!(split.next().unwrap(), r#"{"content":"hello"}"#);
        assert!(split.next().is_none());
    }

    #[test]
    fn test_delete_operation_renders_one_line() {
        let op = DocOperation::delete("docs", "gone.txt");
        let lines = bulk_lines(&op);
        let mut split = lines.lines();

        assert_eq!(
            split.next().unwrap(),
            r#"{"delete":{"_id":"gone.txt","_index":"docs"}}"#
        );
        assert!(split.next().is_none());
    }

    #[test]
    fn test_parse_response_without_errors() {
        let body = json!({"took": 12, "errors": false, "items": []});
        let result = parse_bulk_response(&body, 4, 12);
        assert!(result.is_complete_success());
        assert_eq!(result.success_count, 4);
    }

    #[test]
    fn test_parse_response_with_item_failures() {
        let body = json!({
            "took": 8,
            "errors": true,
            "items": [
                {"index": {"_id": "ok.txt", "status": 201}},
                {"index": {"_id": "bad.txt", "status": 400, "error": {"reason": "mapper parsing failed"}}}
            ]
        });
        let result = parse_bulk_response(&body, 2, 8);
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 1);
        assert_eq!(
            result.failures,
            vec![("bad.txt".to_string(), "mapper parsing failed".to_string())]
        );
        assert!(result.has_successes());
    }
}
