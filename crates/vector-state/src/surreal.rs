//! SurrealDB vector store
//!
//! Stores chunks with their embeddings in a SCHEMAFULL table and ranks them
//! with `vector::similarity::cosine`. Supports both local (in-memory) and
//! remote (WebSocket) connections.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::storage_traits::{
    check_k, is_identifier, Document, Embedder, Metadata, MetadataFilter, ScoredDocument,
    StoreResult, VectorStore,
};

/// Configuration for a SurrealDB connection
#[derive(Debug, Clone)]
pub struct SurrealConfig {
    /// Endpoint URL ("mem://", "ws://host:8000", "surrealkv://path")
    pub endpoint: String,
    /// Namespace (default: "repo_intel")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Chunk table (default: "chunks")
    pub table: String,
    /// Root username, when the server requires sign-in
    pub username: Option<String>,
    /// Root password
    pub password: Option<String>,
}

impl SurrealConfig {
    /// Configuration for the given endpoint with default namespace/database
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: "repo_intel".to_string(),
            database: "main".to_string(),
            table: "chunks".to_string(),
            username: None,
            password: None,
        }
    }

    /// In-memory database
    pub fn in_memory() -> Self {
        Self::new("mem://")
    }

    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_URL (optional, default: "mem://")
    /// - SURREALDB_NAMESPACE (optional, default: "repo_intel")
    /// - SURREALDB_DATABASE (optional, default: "main")
    /// - SURREALDB_USERNAME / SURREALDB_PASSWORD (optional, root sign-in when both set)
    pub fn from_env() -> Self {
        let endpoint = std::env::var("SURREALDB_URL").unwrap_or_else(|_| "mem://".to_string());
        let mut config = Self::new(endpoint);
        if let Ok(ns) = std::env::var("SURREALDB_NAMESPACE") {
            config = config.with_namespace(ns);
        }
        if let Ok(db) = std::env::var("SURREALDB_DATABASE") {
            config = config.with_database(db);
        }
        if let (Ok(user), Ok(pass)) = (
            std::env::var("SURREALDB_USERNAME"),
            std::env::var("SURREALDB_PASSWORD"),
        ) {
            config = config.with_credentials(user, pass);
        }
        config
    }
}

/// Chunk record as stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChunkRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<surrealdb::sql::Thing>,
    content: String,
    source: String,
    metadata: serde_json::Value,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ScoredRow {
    content: String,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    score: Option<f64>,
}

/// Vector store backed by SurrealDB
#[derive(Clone)]
pub struct SurrealVectorStore {
    db: Surreal<Any>,
    table: String,
    embedder: Arc<dyn Embedder>,
}

impl SurrealVectorStore {
    /// Connect to SurrealDB and set up the chunk table
    #[instrument(skip(config, embedder), fields(endpoint = %config.endpoint, namespace = %config.namespace))]
    pub async fn connect(config: SurrealConfig, embedder: Arc<dyn Embedder>) -> StoreResult<Self> {
        if !is_identifier(&config.table) {
            return Err(StoreError::Config(format!(
                "invalid table name: {}",
                config.table
            )));
        }

        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(Root { username, password })
                .await
                .map_err(|e| StoreError::Connection(format!("Root authentication failed: {}", e)))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to select namespace/database: {}", e))
            })?;

        let store = SurrealVectorStore {
            db,
            table: config.table,
            embedder,
        };
        store.init_schema().await?;

        info!("SurrealDB vector store ready (table: {})", store.table);
        Ok(store)
    }

    /// In-memory store, mainly for tests and local runs
    pub async fn in_memory(embedder: Arc<dyn Embedder>) -> StoreResult<Self> {
        Self::connect(SurrealConfig::in_memory(), embedder).await
    }

    async fn init_schema(&self) -> StoreResult<()> {
        debug!("Initializing chunk schema");

        let schema = format!(
            r#"
            DEFINE TABLE IF NOT EXISTS {t} SCHEMAFULL;
            DEFINE FIELD IF NOT EXISTS content ON {t} TYPE string;
            DEFINE FIELD IF NOT EXISTS source ON {t} TYPE string;
            DEFINE FIELD IF NOT EXISTS metadata ON {t} FLEXIBLE TYPE object;
            DEFINE FIELD IF NOT EXISTS embedding ON {t} TYPE array<float>;
            DEFINE INDEX IF NOT EXISTS idx_{t}_source ON {t} FIELDS source;
            "#,
            t = self.table
        );

        self.db
            .query(schema)
            .await
            .and_then(|response| response.check())
            .map_err(|e| StoreError::Connection(format!("Schema setup failed: {e}")))?;
        Ok(())
    }

    /// Number of stored chunks
    pub async fn count(&self) -> StoreResult<usize> {
        let mut response = self
            .db
            .query(format!("SELECT count() FROM {} GROUP ALL", self.table))
            .await?;
        let counts: Vec<serde_json::Value> = response.take(0)?;
        Ok(counts
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|c| c.as_u64())
            .unwrap_or(0) as usize)
    }
}

#[async_trait]
impl VectorStore for SurrealVectorStore {
    #[instrument(skip(self, documents), fields(table = %self.table, count = documents.len()))]
    async fn add_documents(&self, documents: &[Document]) -> StoreResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;

        for (doc, embedding) in documents.iter().zip(embeddings) {
            let record = ChunkRecord {
                id: None,
                content: doc.text.clone(),
                source: doc.source_path().to_string(),
                metadata: serde_json::Value::Object(doc.metadata.clone()),
                embedding,
            };
            let created: Option<ChunkRecord> =
                self.db.create(self.table.as_str()).content(record).await?;
            if created.is_none() {
                return Err(StoreError::Query("Failed to store chunk".to_string()));
            }
        }

        debug!("Stored {} chunks", documents.len());
        Ok(documents.len())
    }

    #[instrument(skip(self, filter), fields(table = %self.table))]
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> StoreResult<Vec<ScoredDocument>> {
        check_k(k)?;

        let mut conditions = Vec::new();
        if let Some(filter) = filter {
            filter.validate_keys()?;
            for (i, (key, _)) in filter.iter().enumerate() {
                conditions.push(format!("metadata.{key} = $f{i}"));
            }
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT content, metadata, vector::similarity::cosine(embedding, $query) AS score \
             FROM {}{} ORDER BY score DESC LIMIT {}",
            self.table, where_clause, k
        );

        let query_embedding = self.embedder.embed_query(query).await?;
        let mut pending = self.db.query(sql).bind(("query", query_embedding));
        if let Some(filter) = filter {
            for (i, (_, value)) in filter.iter().enumerate() {
                pending = pending.bind((format!("f{i}"), value.clone()));
            }
        }

        let mut response = pending.await?;
        let rows: Vec<ScoredRow> = response.take(0)?;

        let results: Vec<ScoredDocument> = rows
            .into_iter()
            .map(|row| {
                let metadata = match row.metadata {
                    Some(serde_json::Value::Object(map)) => map,
                    _ => Metadata::new(),
                };
                ScoredDocument {
                    document: Document {
                        text: row.content,
                        metadata,
                    },
                    score: row.score.unwrap_or(0.0) as f32,
                }
            })
            .collect();

        debug!("Found {} results", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::HashingEmbedder;

    #[test]
    fn test_config_defaults() {
        let config = SurrealConfig::in_memory();
        assert_eq!(config.endpoint, "mem://");
        assert_eq!(config.namespace, "repo_intel");
        assert_eq!(config.table, "chunks");
        assert!(config.username.is_none());
    }

    #[tokio::test]
    async fn test_invalid_table_name_rejected() {
        let config = SurrealConfig::in_memory().with_table("chunks; REMOVE TABLE x");
        let result = SurrealVectorStore::connect(config, Arc::new(HashingEmbedder::default())).await;
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_add_and_count() {
        let store = SurrealVectorStore::in_memory(Arc::new(HashingEmbedder::default()))
            .await
            .unwrap();
        let docs = vec![
            Document::new("billing invoice refund").with_metadata("file_path", "billing/api.py"),
            Document::new("claims adjudication").with_metadata("file_path", "claims/core.py"),
        ];
        assert_eq!(store.add_documents(&docs).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
