//! Supabase (pgvector over PostgREST) vector store
//!
//! Rows live in a table with `id`, `content`, `metadata` and `embedding`
//! columns. Search goes through a SQL function exposed as an RPC
//! (`match_documents` by default) that takes `query_embedding` and a JSON
//! `filter` and returns rows with a `similarity` column.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::storage_traits::{
    check_k, Document, Embedder, Metadata, MetadataFilter, ScoredDocument, StoreResult,
    VectorStore,
};

/// Rows per insert request
const INSERT_BATCH: usize = 500;

/// Supabase connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL (e.g. "https://xyz.supabase.co")
    pub url: String,
    /// Service or anon key
    pub key: String,
    /// Table holding the embeddings
    pub table: String,
    /// Similarity RPC name
    pub query_name: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.into(),
            table: "repository_embeddings".to_string(),
            query_name: "match_documents".to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = query_name.into();
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SUPABASE_URL (required)
    /// - SUPABASE_KEY (required)
    /// - SUPABASE_VECTOR_TABLE (optional, default: "repository_embeddings")
    /// - SUPABASE_QUERY_NAME (optional, default: "match_documents")
    pub fn from_env() -> StoreResult<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| StoreError::Config("SUPABASE_URL not set".to_string()))?;
        let key = std::env::var("SUPABASE_KEY")
            .map_err(|_| StoreError::Config("SUPABASE_KEY not set".to_string()))?;
        let mut config = Self::new(url, key);
        if let Ok(table) = std::env::var("SUPABASE_VECTOR_TABLE") {
            config = config.with_table(table);
        }
        if let Ok(query_name) = std::env::var("SUPABASE_QUERY_NAME") {
            config = config.with_query_name(query_name);
        }
        Ok(config)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.url, self.query_name)
    }
}

#[derive(Serialize)]
struct InsertRow<'a> {
    id: String,
    content: &'a str,
    metadata: &'a Metadata,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct MatchParams<'a> {
    query_embedding: &'a [f32],
    filter: serde_json::Value,
}

#[derive(Deserialize)]
struct MatchRow {
    content: String,
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    similarity: f32,
}

/// Vector store backed by a Supabase project
pub struct SupabaseVectorStore {
    config: SupabaseConfig,
    embedder: Arc<dyn Embedder>,
    http_client: reqwest::Client,
}

impl SupabaseVectorStore {
    pub fn new(config: SupabaseConfig, embedder: Arc<dyn Embedder>) -> StoreResult<Self> {
        if config.url.is_empty() || config.key.is_empty() {
            return Err(StoreError::Config(
                "Supabase configuration is required: set SUPABASE_URL and SUPABASE_KEY"
                    .to_string(),
            ));
        }
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("repo-intel-vector-state/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to create HTTP client: {e}")))?;

        info!("Supabase vector store initialized with table: {}", config.table);
        Ok(Self {
            config,
            embedder,
            http_client,
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.config.key)
            .bearer_auth(&self.config.key)
    }

    async fn ensure_success(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Http(format!("{status}: {body}")))
    }
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    #[instrument(skip(self, documents), fields(table = %self.config.table, count = documents.len()))]
    async fn add_documents(&self, documents: &[Document]) -> StoreResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        for batch in documents.chunks(INSERT_BATCH) {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let embeddings = self.embedder.embed_documents(&texts).await?;

            let rows: Vec<InsertRow<'_>> = batch
                .iter()
                .zip(embeddings)
                .map(|(doc, embedding)| InsertRow {
                    id: uuid::Uuid::new_v4().to_string(),
                    content: &doc.text,
                    metadata: &doc.metadata,
                    embedding,
                })
                .collect();

            let response = self
                .authorized(self.http_client.post(self.config.table_url()))
                .header("Prefer", "return=minimal")
                .json(&rows)
                .send()
                .await?;
            Self::ensure_success(response).await?;
            debug!("Inserted batch of {} rows", rows.len());
        }

        Ok(documents.len())
    }

    #[instrument(skip(self, filter), fields(table = %self.config.table))]
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> StoreResult<Vec<ScoredDocument>> {
        check_k(k)?;
        let query_embedding = self.embedder.embed_query(query).await?;
        let params = MatchParams {
            query_embedding: &query_embedding,
            filter: filter
                .map(MetadataFilter::to_json)
                .unwrap_or_else(|| serde_json::json!({})),
        };

        let response = self
            .authorized(self.http_client.post(self.config.rpc_url()))
            .query(&[("limit", k.to_string())])
            .json(&params)
            .send()
            .await?;
        let rows: Vec<MatchRow> = Self::ensure_success(response).await?.json().await?;

        let results: Vec<ScoredDocument> = rows
            .into_iter()
            .take(k)
            .map(|row| ScoredDocument {
                document: Document {
                    text: row.content,
                    metadata: row.metadata.unwrap_or_default(),
                },
                score: row.similarity,
            })
            .collect();

        debug!("Found {} results", results.len());
        Ok(results)
    }
}
