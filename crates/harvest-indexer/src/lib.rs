//! # Harvest Indexer
//!
//! Bulk batching/flushing engine for doc-harvest, plus the Elasticsearch
//! adapter that transmits batches.
//!
//! ## Components
//!
//! - `OperationBatch`: size-tracking accumulator with count/byte thresholds
//! - `BulkListener`: before/after hooks around every transmission
//! - `BulkProcessor`: concurrency-safe orchestrator with three independent
//!   flush triggers (count, bytes, interval)
//! - `EsBulkEngine`: `_bulk` NDJSON adapter
//!
//! ## Usage
//!
//! ```rust,ignore
//! let engine = EsBulkEngine::new(es_config)?;
//! let processor = BulkProcessor::builder(engine)
//!     .listener(LoggingListener::new("indexer"))
//!     .max_actions(1000)
//!     .max_bytes(10 * 1024 * 1024)
//!     .flush_interval(Duration::from_secs(5))
//!     .build();
//!
//! processor.add(DocOperation::index("docs", "a.txt", source)).await?;
//! processor.close().await?;
//! ```

pub mod batch;
pub mod es_engine;
pub mod listener;
pub mod processor;

pub use batch::*;
pub use es_engine::*;
pub use listener::*;
pub use processor::*;
