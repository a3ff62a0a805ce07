//! Error types for rag-analysis.

use vector_state::StoreError;

/// Errors produced by a language model client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("language model configuration error: {0}")]
    Config(String),

    #[error("language model request failed: {0}")]
    Http(String),

    #[error("language model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("language model returned no completion")]
    EmptyCompletion,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Http(err.to_string())
    }
}

/// Errors produced by the analysis pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Request failed boundary validation
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("evidence retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    #[error("model invocation failed: {0}")]
    Model(#[from] LlmError),
}

impl AnalysisError {
    /// Whether the caller supplied bad input (as opposed to a dependency failing)
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalysisError::InvalidRequest(_))
    }
}

/// Result type for analysis operations.
pub type StageResult<T> = std::result::Result<T, AnalysisError>;
