//! Error types for doc-harvest
//!
//! Uses `thiserror` for ergonomic error handling with full context preservation.

use thiserror::Error;

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Primary error type for all harvest operations
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Elasticsearch connection or bulk request errors
    #[error("Elasticsearch error: {message}")]
    Elasticsearch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Document source listing/reading errors
    #[error("Crawl error: {message}")]
    Crawl {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Content extraction errors
    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Message serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Operation submitted to a bulk processor that has been closed
    #[error("Bulk processor is closed")]
    ProcessorClosed,

    /// Operation timeout
    #[error("Timeout: {operation} exceeded {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// Graceful shutdown requested
    #[error("Shutdown requested")]
    Shutdown,

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HarvestError {
    /// Create an Elasticsearch error
    pub fn elasticsearch(message: impl Into<String>) -> Self {
        Self::Elasticsearch {
            message: message.into(),
            source: None,
        }
    }

    /// Create an Elasticsearch error with source
    pub fn elasticsearch_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Elasticsearch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a crawl error
    pub fn crawl(message: impl Into<String>) -> Self {
        Self::Crawl {
            message: message.into(),
            source: None,
        }
    }

    /// Create a crawl error with source
    pub fn crawl_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Crawl {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
            source: None,
        }
    }

    /// Create an extraction error with source
    pub fn extraction_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Extraction {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a serialization error with source
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Check if error is retryable
    ///
    /// Per-document failures of this kind are skipped by the crawl loop;
    /// everything else aborts the crawl.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Crawl { .. } | Self::Extraction { .. } | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(HarvestError::crawl("unreadable file").is_retryable());
        assert!(HarvestError::extraction("bad encoding").is_retryable());
        assert!(!HarvestError::ProcessorClosed.is_retryable());
        assert!(!HarvestError::config("missing hosts").is_retryable());
    }

    #[test]
    fn test_source_chain_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = HarvestError::crawl_with_source("failed to read", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
