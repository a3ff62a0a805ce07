//! Evidence retrieval over a vector store.

use std::sync::Arc;

use tracing::{debug, instrument};
use vector_state::{Document, MetadataFilter, VectorStore};

use crate::error::StageResult;

/// Thin wrapper over a [`VectorStore`] shared by every stage.
///
/// No retries: a failed search fails the request that issued it.
#[derive(Clone)]
pub struct EvidenceRetriever {
    store: Arc<dyn VectorStore>,
}

impl EvidenceRetriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        EvidenceRetriever { store }
    }

    /// Top-`k` fragments for `query`, best first.
    #[instrument(skip(self, filter), fields(query_chars = query.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> StageResult<Vec<Document>> {
        let documents = self.store.similarity_search(query, k, filter).await?;
        debug!("Retrieved {} fragments", documents.len());
        Ok(documents)
    }
}

/// Fragment texts joined by blank lines, as fed to prompts
pub fn join_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
