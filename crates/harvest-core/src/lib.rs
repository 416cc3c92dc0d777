//! # Harvest Core
//!
//! Core types, strategy traits, and utilities for doc-harvest.
//!
//! This crate defines the fundamental abstractions using the Strategy pattern,
//! enabling pluggable implementations for:
//! - Document listing/reading (local filesystem, HTTP, remote protocols)
//! - Content extraction (external text/metadata extraction service)
//! - Bulk transmission (Elasticsearch bulk API)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌───────────────┐
//! │DocumentSource│────►│   Content    │────►│ BulkProcessor │
//! │   Strategy   │     │  Extractor   │     │  + BulkEngine │
//! └──────────────┘     └──────────────┘     └───────────────┘
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod metrics;
pub mod strategy;

pub use config::*;
pub use document::*;
pub use error::*;
pub use metrics::*;
pub use strategy::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::HarvestConfig;
    pub use crate::document::{DocAction, DocOperation, ExtractedDocument, RawDocument};
    pub use crate::error::{HarvestError, Result};
    pub use crate::strategy::{
        BulkEngine, BulkResponse, ContentExtractor, DocumentSource, HealthCheck, Lifecycle,
    };
}
