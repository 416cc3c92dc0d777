//! Strategy Pattern Traits for doc-harvest
//!
//! This module defines the core abstractions that enable pluggable
//! implementations across the pipeline. Each trait represents a strategy that
//! can be swapped at runtime or compile time.
//!
//! ## Design Philosophy
//!
//! - **Async-first**: All I/O operations are async
//! - **Stream-based**: Documents flow as async streams for backpressure
//! - **Composable**: Strategies can be chained and combined
//! - **Observable**: Built-in hooks for metrics and tracing
//!
//! ## Strategy Hierarchy
//!
//! ```text
//! Lifecycle (start/stop)
//!     │
//!     └── DocumentSource (lists and reads documents)
//!             └── LocalFsSource, HttpSource, FtpSource, ...
//!
//! ContentExtractor (bytes → text + metadata)
//!     └── TikaExtractor, PlainTextExtractor, ...
//!
//! BulkEngine (transmits a batch to the indexing backend)
//!     └── EsBulkEngine, ...
//! ```

use crate::document::RawDocument;
use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Type alias for boxed async streams of raw documents
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<RawDocument>> + Send>>;

// ============================================================================
// Lifecycle Management
// ============================================================================

/// Lifecycle management for components
///
/// Provides graceful startup and shutdown semantics.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Start the component
    ///
    /// Called once before any operations. Should establish connections,
    /// initialize state, and prepare for operation.
    async fn start(&self) -> Result<()>;

    /// Stop the component gracefully
    ///
    /// Called during shutdown. Should release resources. May be called even
    /// if start() failed.
    async fn stop(&self) -> Result<()>;

    /// Check if the component is running
    fn is_running(&self) -> bool;
}

/// Health check capability
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Perform health check
    ///
    /// Returns Ok(()) if healthy, Err with details if not.
    async fn health_check(&self) -> Result<()>;

    /// Get component name for health reporting
    fn component_name(&self) -> &'static str;
}

// ============================================================================
// Source Strategies
// ============================================================================

/// Document source strategy - lists and reads documents from a backend
///
/// Implementations:
/// - `LocalFsSource`: Walks a local directory tree
/// - `HttpSource`: Fetches a configured list of URLs
/// - `FtpSource`, `SshSource`, `S3Source`: Remote protocol backends
#[async_trait]
pub trait DocumentSource: Lifecycle + HealthCheck {
    /// Stream documents from the source
    ///
    /// Yields one `RawDocument` per discovered item. Per-document read
    /// failures surface as `Err` items; the stream continues past them.
    async fn documents(&self) -> Result<DocumentStream>;

    /// Source name, used for document attribution and logging
    fn name(&self) -> &str;
}

// ============================================================================
// Extraction Strategy
// ============================================================================

/// Content extraction strategy - turns raw bytes into text and metadata
///
/// The extraction service itself is an external collaborator (e.g. a Tika
/// server); this trait is the boundary the pipeline consumes it through.
///
/// Implementations:
/// - `TikaExtractor`: HTTP extraction service
/// - `PlainTextExtractor`: UTF-8 passthrough
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Extract text content and metadata from a raw document
    async fn extract(&self, raw: &RawDocument) -> Result<crate::document::ExtractedDocument>;

    /// Get extractor name for logging
    fn name(&self) -> &'static str;
}

// ============================================================================
// Bulk Engine Strategy
// ============================================================================

/// Result of transmitting one batch to the indexing backend
#[derive(Debug, Clone)]
pub struct BulkResponse {
    /// Number of operations the backend accepted
    pub success_count: usize,
    /// Number of operations the backend rejected
    pub failure_count: usize,
    /// Rejected document IDs with error messages
    pub failures: Vec<(String, String)>,
    /// Time taken for the request
    pub duration_ms: u64,
}

impl BulkResponse {
    /// Create a fully successful response
    pub fn success(count: usize, duration_ms: u64) -> Self {
        Self {
            success_count: count,
            failure_count: 0,
            failures: Vec::new(),
            duration_ms,
        }
    }

    /// Check if all operations succeeded
    pub fn is_complete_success(&self) -> bool {
        self.failure_count == 0
    }

    /// Check if any operations succeeded
    pub fn has_successes(&self) -> bool {
        self.success_count > 0
    }
}

/// Bulk transmission strategy - the only component that talks to the backend
///
/// Consumed by the bulk processor, which treats it as opaque and synchronous
/// from the flush path's perspective. Implementations translate a batch of
/// generic operations into a protocol-specific bulk write request.
///
/// Implementations:
/// - `EsBulkEngine`: Elasticsearch `_bulk` NDJSON API
#[async_trait]
pub trait BulkEngine: Send + Sync {
    /// Transmit a batch and parse the backend response
    async fn execute(
        &self,
        batch: &[crate::document::DocOperation],
    ) -> Result<BulkResponse>;
}
