//! Error types for vector-state

use thiserror::Error;

/// Errors that can occur in the vector persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend connection error
    #[error("Vector store connection failed: {0}")]
    Connection(String),

    /// Backend query error
    #[error("Vector store query failed: {0}")]
    Query(String),

    /// Embedding API error
    #[error("Embedding request failed: {0}")]
    Embedding(String),

    /// HTTP error (Supabase REST, embedding API)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Filter keys are interpolated into queries and must be plain identifiers
    #[error("Invalid metadata filter key: {key}")]
    InvalidFilterKey { key: String },

    /// Caller supplied an unusable query (e.g. k == 0)
    #[error("Invalid search request: {0}")]
    InvalidQuery(String),

    /// Missing or malformed configuration
    #[error("Vector store configuration error: {0}")]
    Config(String),
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_key_error_names_key() {
        let err = StoreError::InvalidFilterKey {
            key: "file_path; DROP".to_string(),
        };
        assert!(err.to_string().contains("file_path; DROP"));
    }

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let err: StoreError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
