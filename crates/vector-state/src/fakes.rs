//! In-memory fakes for storage traits (testing only)
//!
//! Provides `HashingEmbedder` and `MemoryVectorStore` that satisfy the trait
//! contracts without any network or database dependencies.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// HashingEmbedder
// ---------------------------------------------------------------------------

/// Deterministic bag-of-words embedder.
///
/// Each lowercase alphanumeric token is hashed into one of `dims` buckets and
/// the resulting vector is L2-normalized. Texts that share words land close
/// together, which is enough to exercise ranking in tests.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dims as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> StoreResult<Vec<f32>> {
        Ok(self.embed(text))
    }
}

// ---------------------------------------------------------------------------
// MemoryVectorStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredChunk {
    document: Document,
    embedding: Vec<f32>,
}

/// In-memory vector store backed by a `Vec` of embedded chunks.
///
/// Ties are broken by insertion order so repeated searches are stable.
pub struct MemoryVectorStore {
    chunks: Mutex<Vec<StoredChunk>>,
    embedder: Arc<dyn Embedder>,
    search_calls: AtomicUsize,
    fail_searches: AtomicBool,
}

impl MemoryVectorStore {
    /// Store using the default `HashingEmbedder`
    pub fn new() -> Self {
        Self::with_embedder(Arc::new(HashingEmbedder::default()))
    }

    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
            embedder,
            search_calls: AtomicUsize::new(0),
            fail_searches: AtomicBool::new(false),
        }
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored documents in insertion order
    pub fn documents(&self) -> Vec<Document> {
        self.chunks
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.document.clone())
            .collect()
    }

    /// How many searches have been issued against this store
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent search fail with a query error
    pub fn fail_searches(&self, fail: bool) {
        self.fail_searches.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add_documents(&self, documents: &[Document]) -> StoreResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;

        let mut chunks = self.chunks.lock().unwrap();
        for (document, embedding) in documents.iter().zip(embeddings) {
            chunks.push(StoredChunk {
                document: document.clone(),
                embedding,
            });
        }
        Ok(documents.len())
    }

    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> StoreResult<Vec<ScoredDocument>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        check_k(k)?;
        if self.fail_searches.load(Ordering::SeqCst) {
            return Err(StoreError::Query("simulated search failure".to_string()));
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        let chunks = self.chunks.lock().unwrap();
        let mut scored: Vec<ScoredDocument> = chunks
            .iter()
            .filter(|c| filter.map_or(true, |f| f.matches(&c.document.metadata)))
            .map(|c| ScoredDocument {
                document: c.document.clone(),
                score: cosine_similarity(&query_embedding, &c.embedding),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_query("Billing invoice").await.unwrap();
        let b = embedder.embed_query("billing INVOICE").await.unwrap();
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        let v = embedder.embed_query("  ").await.unwrap();
        assert_eq!(v, vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_search_counts_and_failure_toggle() {
        let store = MemoryVectorStore::new();
        store
            .add_documents(&[Document::new("claims adjudication")])
            .await
            .unwrap();

        store.similarity_search("claims", 1, None).await.unwrap();
        assert_eq!(store.search_calls(), 1);

        store.fail_searches(true);
        let err = store.similarity_search("claims", 1, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
        assert_eq!(store.search_calls(), 2);
    }
}
