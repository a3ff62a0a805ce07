//! Trait contract tests for VectorStore.
//!
//! These tests verify the behavioral contracts of the storage traits
//! using the in-memory fake and an in-memory SurrealDB. Any conforming
//! implementation must pass these.

use std::sync::Arc;

use vector_state::fakes::{HashingEmbedder, MemoryVectorStore};
use vector_state::{Document, MetadataFilter, StoreError, SurrealVectorStore, VectorStore};

fn corpus() -> Vec<Document> {
    vec![
        Document::new("billing invoice refund handler")
            .with_metadata("file_path", "billing/api.py")
            .with_metadata("file_type", ".py"),
        Document::new("claims adjudication rules engine")
            .with_metadata("file_path", "claims/rules.py")
            .with_metadata("file_type", ".py"),
        Document::new("project readme describing billing setup")
            .with_metadata("file_path", "README.md")
            .with_metadata("file_type", ".md"),
        Document::new("deployment manifest for workers")
            .with_metadata("file_path", "deploy/workers.yaml")
            .with_metadata("file_type", ".yaml"),
    ]
}

async fn memory_store() -> MemoryVectorStore {
    let store = MemoryVectorStore::new();
    store.add_documents(&corpus()).await.unwrap();
    store
}

async fn surreal_store() -> SurrealVectorStore {
    let store = SurrealVectorStore::in_memory(Arc::new(HashingEmbedder::default()))
        .await
        .unwrap();
    store.add_documents(&corpus()).await.unwrap();
    store
}

// ===========================================================================
// MemoryVectorStore
// ===========================================================================

#[tokio::test]
async fn memory_add_reports_count() {
    let store = MemoryVectorStore::new();
    let added = store.add_documents(&corpus()).await.unwrap();
    assert_eq!(added, 4);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn memory_add_empty_is_noop() {
    let store = MemoryVectorStore::new();
    assert_eq!(store.add_documents(&[]).await.unwrap(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn memory_results_never_exceed_k() {
    let store = memory_store().await;
    let results = store.similarity_search("billing", 2, None).await.unwrap();
    assert_eq!(results.len(), 2);

    let results = store.similarity_search("billing", 20, None).await.unwrap();
    assert_eq!(results.len(), 4);
}

#[tokio::test]
async fn memory_results_ranked_descending() {
    let store = memory_store().await;
    let results = store
        .similarity_search_with_score("claims adjudication rules", 4, None)
        .await
        .unwrap();

    assert_eq!(results[0].document.source_path(), "claims/rules.py");
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn memory_repeated_search_is_stable() {
    let store = memory_store().await;
    let first = store.similarity_search("workers", 3, None).await.unwrap();
    let second = store.similarity_search("workers", 3, None).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn memory_zero_k_rejected() {
    let store = memory_store().await;
    let err = store.similarity_search("billing", 0, None).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidQuery(_)));
}

#[tokio::test]
async fn memory_filter_restricts_results() {
    let store = memory_store().await;
    let filter = MetadataFilter::new().with("file_type", ".md");
    let results = store
        .similarity_search("billing", 4, Some(&filter))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_path(), "README.md");
}

#[tokio::test]
async fn memory_search_on_empty_store_returns_nothing() {
    let store = MemoryVectorStore::new();
    let results = store.similarity_search("anything", 5, None).await.unwrap();
    assert!(results.is_empty());
}

// ===========================================================================
// SurrealVectorStore (mem://)
// ===========================================================================

#[tokio::test]
async fn surreal_results_never_exceed_k() {
    let store = surreal_store().await;
    let results = store.similarity_search("billing", 2, None).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn surreal_best_match_first() {
    let store = surreal_store().await;
    let results = store
        .similarity_search_with_score("claims adjudication rules", 4, None)
        .await
        .unwrap();

    assert_eq!(results[0].document.source_path(), "claims/rules.py");
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn surreal_filter_restricts_results() {
    let store = surreal_store().await;
    let filter = MetadataFilter::new().with("file_type", ".md");
    let results = store
        .similarity_search("billing", 4, Some(&filter))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source_path(), "README.md");
}

#[tokio::test]
async fn surreal_bad_filter_key_rejected() {
    let store = surreal_store().await;
    let filter = MetadataFilter::new().with("x = 1 OR y", true);
    let err = store
        .similarity_search("billing", 4, Some(&filter))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidFilterKey { .. }));
}

#[tokio::test]
async fn surreal_zero_k_rejected() {
    let store = surreal_store().await;
    let err = store.similarity_search("billing", 0, None).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidQuery(_)));
}
