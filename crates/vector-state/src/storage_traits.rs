//! Storage trait definitions for repository intelligence
//!
//! These traits define the core vector storage abstractions:
//! - `VectorStore`: add chunked documents, rank them against a query
//! - `Embedder`: turn text into dense vectors
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Free-form document metadata
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key holding the source identifier of a chunk
pub const SOURCE_KEY: &str = "file_path";

/// Source identifier used when a chunk carries no `file_path`
pub const UNKNOWN_SOURCE: &str = "unknown";

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A chunk of repository text plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Chunk text (what gets embedded)
    pub text: String,
    /// Source metadata (file_path, file_name, page, ...)
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with empty metadata
    pub fn new(text: impl Into<String>) -> Self {
        Document {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Source identifier (`file_path` metadata), or `"unknown"`.
    pub fn source_path(&self) -> &str {
        self.metadata
            .get(SOURCE_KEY)
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_SOURCE)
    }
}

/// A document returned from similarity search with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Backend similarity score, higher is closer
    pub score: f32,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Exact-match filter over document metadata.
///
/// Every entry must match for a document to be returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter(BTreeMap<String, serde_json::Value>);

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key == value`
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    /// Whether the metadata satisfies every entry of the filter.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.0
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }

    /// The filter as a JSON object (the shape PostgREST RPCs expect).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.clone().into_iter().collect())
    }

    /// Reject keys that are not plain identifiers.
    ///
    /// Backends that splice keys into query text call this first.
    pub fn validate_keys(&self) -> StoreResult<()> {
        for key in self.0.keys() {
            if !is_identifier(key) {
                return Err(StoreError::InvalidFilterKey { key: key.clone() });
            }
        }
        Ok(())
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// VectorStore
// ---------------------------------------------------------------------------

/// Vector similarity store.
///
/// Guarantees:
/// - Results are ranked by descending similarity and never exceed `k`.
/// - Repeating a search against an unchanged index yields the same ranking.
/// - `k == 0` is rejected with `StoreError::InvalidQuery`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and persist documents. Returns the number stored.
    async fn add_documents(&self, documents: &[Document]) -> StoreResult<usize>;

    /// Rank stored documents against `query`, returning scores.
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> StoreResult<Vec<ScoredDocument>>;

    /// Rank stored documents against `query`.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> StoreResult<Vec<Document>> {
        let scored = self.similarity_search_with_score(query, k, filter).await?;
        Ok(scored.into_iter().map(|s| s.document).collect())
    }
}

// ---------------------------------------------------------------------------
// Embedder
// ---------------------------------------------------------------------------

/// Text embedding provider.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts; output order matches input order.
    async fn embed_documents(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> StoreResult<Vec<f32>>;
}

/// Cosine similarity of two vectors; 0.0 when either is all zeros or the
/// dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

pub(crate) fn check_k(k: usize) -> StoreResult<()> {
    if k == 0 {
        return Err(StoreError::InvalidQuery(
            "k must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_path_defaults_to_unknown() {
        let doc = Document::new("fn main() {}");
        assert_eq!(doc.source_path(), UNKNOWN_SOURCE);

        let doc = doc.with_metadata(SOURCE_KEY, "billing/api.py");
        assert_eq!(doc.source_path(), "billing/api.py");
    }

    #[test]
    fn test_filter_matches_all_entries() {
        let doc = Document::new("x")
            .with_metadata("file_type", ".py")
            .with_metadata("page", 3);

        let filter = MetadataFilter::new().with("file_type", ".py");
        assert!(filter.matches(&doc.metadata));

        let filter = filter.with("page", 4);
        assert!(!filter.matches(&doc.metadata));
    }

    #[test]
    fn test_filter_rejects_non_identifier_keys() {
        let ok = MetadataFilter::new().with("file_type", ".md");
        assert!(ok.validate_keys().is_ok());

        let bad = MetadataFilter::new().with("a = 1 OR b", true);
        assert!(matches!(
            bad.validate_keys(),
            Err(StoreError::InvalidFilterKey { .. })
        ));
    }

    #[test]
    fn test_filter_to_json_object() {
        let filter = MetadataFilter::new().with("file_type", ".md");
        assert_eq!(filter.to_json(), json!({"file_type": ".md"}));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
