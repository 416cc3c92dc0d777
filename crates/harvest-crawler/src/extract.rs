//! Content extraction strategies
//!
//! Extraction itself is an external service consumed as an opaque function:
//! document bytes in, text plus metadata out. `TikaExtractor` talks to an
//! Apache Tika server; `PlainTextExtractor` is the UTF-8 passthrough used
//! for text-only crawls and in tests.

use async_trait::async_trait;
use harvest_core::config::ExtractorConfig;
use harvest_core::prelude::*;
use serde_json::Value;
use tracing::trace;

// ============================================================================
// Plain Text Extractor
// ============================================================================

/// UTF-8 passthrough extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

#[async_trait]
impl ContentExtractor for PlainTextExtractor {
    async fn extract(&self, raw: &RawDocument) -> Result<ExtractedDocument> {
        let content = String::from_utf8_lossy(&raw.data).into_owned();
        Ok(ExtractedDocument::new(content))
    }

    fn name(&self) -> &'static str {
        "plain_text"
    }
}

// ============================================================================
// Tika Extractor
// ============================================================================

/// Apache Tika extraction client
///
/// Sends document bytes to the server's `/rmeta/text` endpoint and maps the
/// response into an `ExtractedDocument`.
pub struct TikaExtractor {
    client: reqwest::Client,
    base_url: String,
}

impl TikaExtractor {
    /// Create a new Tika client
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HarvestError::extraction_with_source("Failed to create client", e))?;

        Ok(Self {
            client,
            base_url: config.tika_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContentExtractor for TikaExtractor {
    async fn extract(&self, raw: &RawDocument) -> Result<ExtractedDocument> {
        trace!(doc = %raw.id, bytes = raw.len(), "Extracting via Tika");

        let response = self
            .client
            .put(format!("{}/rmeta/text", self.base_url))
            .header("Accept", "application/json")
            .header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", raw.filename),
            )
            .body(raw.data.clone())
            .send()
            .await
            .map_err(|e| HarvestError::extraction_with_source("Tika request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::extraction(format!(
                "Tika returned {status} for {}",
                raw.id
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| HarvestError::extraction_with_source("Failed to parse Tika response", e))?;

        parse_rmeta(&body)
    }

    fn name(&self) -> &'static str {
        "tika"
    }
}

/// Map a Tika `/rmeta` response into an extracted document
///
/// The response is an array with one object per parsed document; the content
/// lives under `X-TIKA:content`, everything else is metadata.
fn parse_rmeta(body: &Value) -> Result<ExtractedDocument> {
    let first = body
        .as_array()
        .and_then(|entries| entries.first())
        .ok_or_else(|| HarvestError::extraction("Empty Tika response"))?;

    let content = first["X-TIKA:content"]
        .as_str()
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut extracted = ExtractedDocument::new(content);

    if let Some(title) = first["dc:title"].as_str() {
        if !title.is_empty() {
            extracted = extracted.with_title(title);
        }
    }

    if let Some(fields) = first.as_object() {
        for (key, value) in fields {
            if key.starts_with("X-TIKA:") || key == "dc:title" {
                continue;
            }
            if let Some(value) = value.as_str() {
                extracted = extracted.with_metadata(key.clone(), value);
            }
        }
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_plain_text_extraction() {
        let raw = RawDocument::new("a.txt", "test", "a.txt", "plain contents");
        let extracted = PlainTextExtractor.extract(&raw).await.unwrap();
        assert_eq!(extracted.content, "plain contents");
        assert!(extracted.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_plain_text_is_lossy_on_invalid_utf8() {
        let raw = RawDocument::new("bin", "test", "bin", vec![0x66, 0x6f, 0xff, 0x6f]);
        let extracted = PlainTextExtractor.extract(&raw).await.unwrap();
        assert!(extracted.content.contains('\u{fffd}'));
    }

    #[test]
    fn test_parse_rmeta_content_title_and_metadata() {
        let body = json!([{
            "X-TIKA:content": "\n  Extracted body text\n",
            "X-TIKA:parse_time_millis": "12",
            "dc:title": "Annual Report",
            "Content-Type": "application/pdf",
            "dc:creator": "finance"
        }]);

        let extracted = parse_rmeta(&body).unwrap();
        assert_eq!(extracted.content, "Extracted body text");
        assert_eq!(extracted.title.as_deref(), Some("Annual Report"));
        assert_eq!(
            extracted.metadata.get("Content-Type").map(String::as_str),
            Some("application/pdf")
        );
        assert_eq!(
            extracted.metadata.get("dc:creator").map(String::as_str),
            Some("finance")
        );
        assert!(!extracted.metadata.contains_key("X-TIKA:parse_time_millis"));
    }

    #[test]
    fn test_parse_rmeta_rejects_empty_response() {
        assert!(parse_rmeta(&json!([])).is_err());
        assert!(parse_rmeta(&json!({})).is_err());
    }
}
