//! OpenAI-compatible embedding client
//!
//! Calls `POST {base_url}/embeddings` and returns one vector per input.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::storage_traits::{Embedder, StoreResult};

/// Default embedding API base
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Embedding client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// API base URL (no trailing slash)
    pub base_url: String,
    /// Embedding model name
    pub model: String,
}

impl EmbeddingConfig {
    /// Create config with the default base URL and model
    pub fn new(api_key: &str) -> Self {
        EmbeddingConfig {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - OPENAI_API_KEY (required)
    /// - OPENAI_BASE_URL (optional)
    /// - OPENAI_EMBEDDING_MODEL (optional)
    pub fn from_env() -> StoreResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| StoreError::Config("OPENAI_API_KEY not set".to_string()))?;
        let mut config = Self::new(&api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config = config.with_base_url(&base_url);
        }
        if let Ok(model) = std::env::var("OPENAI_EMBEDDING_MODEL") {
            config = config.with_model(&model);
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
pub struct OpenAiEmbedder {
    config: EmbeddingConfig,
    http_client: reqwest::Client,
}

impl OpenAiEmbedder {
    /// Create a new embedder
    pub fn new(config: EmbeddingConfig) -> StoreResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("repo-intel-vector-state/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(OpenAiEmbedder {
            config,
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip(self, texts), fields(model = %self.config.model, count = texts.len()))]
    async fn embed_documents(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.config.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Embedding(format!("{status}: {body}")));
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(StoreError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|item| item.index);
        debug!("Embedded {} texts", parsed.data.len());

        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }

    async fn embed_query(&self, text: &str) -> StoreResult<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| StoreError::Embedding("empty embedding response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder_trims_trailing_slash() {
        let config = EmbeddingConfig::new("sk-test")
            .with_base_url("http://localhost:8080/v1/")
            .with_model("text-embedding-3-small");

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "text-embedding-3-small");
        assert_eq!(config.api_key, "sk-test");
    }

    #[test]
    fn test_default_model() {
        let embedder = OpenAiEmbedder::new(EmbeddingConfig::new("k")).unwrap();
        assert_eq!(embedder.model(), DEFAULT_EMBEDDING_MODEL);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        // Points at an unroutable address; an HTTP call would fail.
        let config = EmbeddingConfig::new("k").with_base_url("http://127.0.0.1:1");
        let embedder = OpenAiEmbedder::new(config).unwrap();
        let vectors = embedder.embed_documents(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
