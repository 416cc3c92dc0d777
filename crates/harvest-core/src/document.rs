//! Document types for doc-harvest
//!
//! Defines the raw/extracted document structures that flow through the crawl
//! pipeline and the index/delete operations handed to the bulk subsystem.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

/// Bulk operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocAction {
    /// Document indexed (create or overwrite)
    Index,
    /// Document removed from the index
    Delete,
}

impl DocAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Delete => "delete",
        }
    }

    /// Check if this action carries a document body
    pub fn requires_body(&self) -> bool {
        matches!(self, Self::Index)
    }
}

impl std::fmt::Display for DocAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single unit of work for the bulk subsystem
///
/// The payload is opaque to the batching layer, which only ever looks at
/// `size_estimate()` and operation count. The size estimate is computed once
/// at construction and never changes afterwards.
#[derive(Debug, Clone)]
pub struct DocOperation {
    action: DocAction,
    index: String,
    doc_id: String,
    source: Option<serde_json::Value>,
    size_estimate: u64,
}

impl DocOperation {
    /// Create an index operation
    pub fn index(
        index: impl Into<String>,
        doc_id: impl Into<String>,
        source: serde_json::Value,
    ) -> Self {
        let index = index.into();
        let doc_id = doc_id.into();
        let size_estimate = estimate_size(&index, &doc_id, Some(&source));
        Self {
            action: DocAction::Index,
            index,
            doc_id,
            source: Some(source),
            size_estimate,
        }
    }

    /// Create a delete operation
    pub fn delete(index: impl Into<String>, doc_id: impl Into<String>) -> Self {
        let index = index.into();
        let doc_id = doc_id.into();
        let size_estimate = estimate_size(&index, &doc_id, None);
        Self {
            action: DocAction::Delete,
            index,
            doc_id,
            source: None,
            size_estimate,
        }
    }

    pub fn action(&self) -> DocAction {
        self.action
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn source(&self) -> Option<&serde_json::Value> {
        self.source.as_ref()
    }

    /// Estimated wire size in bytes, fixed at construction
    pub fn size_estimate(&self) -> u64 {
        self.size_estimate
    }
}

/// Wire-size estimate: serialized body length plus routing identifiers
fn estimate_size(index: &str, doc_id: &str, source: Option<&serde_json::Value>) -> u64 {
    let body = source.map(|s| s.to_string().len()).unwrap_or(0);
    (body + index.len() + doc_id.len()) as u64
}

/// A document as yielded by a `DocumentSource`, before extraction
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Stable identifier within the source (relative path or URL)
    pub id: String,

    /// Name of the source that produced this document
    pub source_name: String,

    /// File name without any directory components
    pub filename: String,

    /// Raw document bytes
    pub data: Bytes,

    /// Last modification time, when the source knows it
    pub modified: Option<DateTime<Utc>>,
}

impl RawDocument {
    /// Create a new raw document
    pub fn new(
        id: impl Into<String>,
        source_name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            id: id.into(),
            source_name: source_name.into(),
            filename: filename.into(),
            data: data.into(),
            modified: None,
        }
    }

    /// Builder: set modification time
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Extraction output: plain-text content plus metadata
#[derive(Debug, Clone, Default)]
pub struct ExtractedDocument {
    /// Extracted plain-text content
    pub content: String,

    /// Document title, when the extractor found one
    pub title: Option<String>,

    /// Flat metadata map (author, content type, language, ...)
    pub metadata: HashMap<String, String>,
}

impl ExtractedDocument {
    /// Create from bare content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            title: None,
            metadata: HashMap::new(),
        }
    }

    /// Builder: set title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder: add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Build the JSON body indexed for this document
    pub fn to_source(&self, raw: &RawDocument) -> serde_json::Value {
        let mut doc = json!({
            "content": self.content,
            "file": {
                "filename": raw.filename,
                "filesize": raw.len(),
                "source": raw.source_name,
            },
            "path": raw.id,
            "indexed_at": Utc::now(),
        });

        if let Some(modified) = raw.modified {
            doc["file"]["last_modified"] = json!(modified);
        }
        if let Some(ref title) = self.title {
            doc["title"] = json!(title);
        }
        if !self.metadata.is_empty() {
            doc["meta"] = json!(self.metadata);
        }

        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_estimate_fixed_at_construction() {
        let op = DocOperation::index("docs", "a/b.txt", json!({"content": "hello"}));
        let expected = json!({"content": "hello"}).to_string().len() + "docs".len() + "a/b.txt".len();
        assert_eq!(op.size_estimate(), expected as u64);

        // Same inputs always produce the same estimate
        let op2 = DocOperation::index("docs", "a/b.txt", json!({"content": "hello"}));
        assert_eq!(op.size_estimate(), op2.size_estimate());
    }

    #[test]
    fn test_delete_operation_has_no_body() {
        let op = DocOperation::delete("docs", "gone.txt");
        assert_eq!(op.action(), DocAction::Delete);
        assert!(op.source().is_none());
        assert_eq!(op.size_estimate(), ("docs".len() + "gone.txt".len()) as u64);
    }

    #[test]
    fn test_to_source_shape() {
        let raw = RawDocument::new("sub/report.txt", "shared-drive", "report.txt", "raw bytes")
            .with_modified(Utc::now());
        let extracted = ExtractedDocument::new("extracted text")
            .with_title("Quarterly Report")
            .with_metadata("author", "ops");

        let source = extracted.to_source(&raw);
        assert_eq!(source["content"], "extracted text");
        assert_eq!(source["title"], "Quarterly Report");
        assert_eq!(source["file"]["filename"], "report.txt");
        assert_eq!(source["file"]["source"], "shared-drive");
        assert_eq!(source["path"], "sub/report.txt");
        assert_eq!(source["meta"]["author"], "ops");
        assert!(source["file"]["last_modified"].is_string());
    }
}
