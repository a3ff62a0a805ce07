//! Error taxonomy for settings and indexing.

use rag_analysis::LlmError;
use repo_loader::LoaderError;
use vector_state::StoreError;

/// Errors raised while reading settings or building collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("unknown VECTOR_BACKEND {0:?} (expected \"supabase\" or \"surreal\")")]
    UnknownBackend(String),

    #[error("invalid LOG_LEVEL {0:?}")]
    InvalidLogLevel(String),

    #[error("invalid REPO_INTEL_BIND {0:?}")]
    InvalidBind(String),

    #[error("invalid chunking settings: {0}")]
    Chunking(#[from] LoaderError),

    #[error("vector store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("language model setup failed: {0}")]
    Model(#[from] LlmError),
}

/// Errors raised while indexing a source.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Repository path does not exist: {0}")]
    PathNotFound(String),

    #[error("{0}")]
    UnsupportedSource(String),

    #[error("No documents found to index")]
    NoDocuments,

    #[error("Failed to load repository: {0}")]
    Loader(LoaderError),

    #[error("Failed to store documents: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Indexing task failed: {0}")]
    Task(String),
}

impl IndexError {
    /// Whether the caller pointed at something that cannot be indexed
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IndexError::PathNotFound(_) | IndexError::UnsupportedSource(_)
        )
    }
}

impl From<LoaderError> for IndexError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::PathNotFound(path) => IndexError::PathNotFound(path),
            LoaderError::UnsupportedSource(msg) => IndexError::UnsupportedSource(msg),
            other => IndexError::Loader(other),
        }
    }
}

impl From<tokio::task::JoinError> for IndexError {
    fn from(err: tokio::task::JoinError) -> Self {
        IndexError::Task(err.to_string())
    }
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_errors_keep_client_classification() {
        let err = IndexError::from(LoaderError::PathNotFound("/nope".to_string()));
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Repository path does not exist: /nope");

        let err = IndexError::from(LoaderError::CloneFailed("exit 128".to_string()));
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("exit 128"));
    }

    #[test]
    fn test_no_documents_message() {
        assert_eq!(IndexError::NoDocuments.to_string(), "No documents found to index");
        assert!(!IndexError::NoDocuments.is_client_error());
    }
}
