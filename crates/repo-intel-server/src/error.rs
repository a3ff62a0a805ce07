//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": message, "hint"?: text}`.
//! Caller mistakes are 400; dependency failures are 500 and logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rag_analysis::AnalysisError;
use repo_intel_core::IndexError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        hint: Option<String>,
    },

    #[error("{message}")]
    Internal {
        message: String,
        hint: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            hint: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(self, text: impl Into<String>) -> Self {
        match self {
            ApiError::BadRequest { message, .. } => ApiError::BadRequest {
                message,
                hint: Some(text.into()),
            },
            ApiError::Internal { message, .. } => ApiError::Internal {
                message,
                hint: Some(text.into()),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a stage failure; `action` prefixes server-side failures, e.g.
    /// "Failed to process question".
    pub fn from_analysis(action: &str, err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidRequest(message) => ApiError::bad_request(message),
            other => {
                error!("{}: {}", action, other);
                ApiError::internal(format!("{action}: {other}"))
            }
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::PathNotFound(path) => {
                ApiError::bad_request(format!("Path does not exist: {path}"))
                    .with_hint("Please provide a valid file or directory path")
            }
            IndexError::UnsupportedSource(message) => ApiError::bad_request(message),
            IndexError::NoDocuments => {
                error!("Indexing produced no documents");
                ApiError::internal(IndexError::NoDocuments.to_string())
                    .with_hint("Ensure the path is correct and contains indexable files")
            }
            other => {
                error!("Error during indexing: {}", other);
                ApiError::internal(format!("Indexing failed: {other}"))
                    .with_hint("Check server logs for more information")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (message, hint) = match &self {
            ApiError::BadRequest { message, hint } | ApiError::Internal { message, hint } => {
                (message.as_str(), hint.as_deref())
            }
        };
        let body = ErrorBody {
            error: message,
            hint,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_errors_split_by_cause() {
        let err = ApiError::from_analysis(
            "Failed to process question",
            AnalysisError::InvalidRequest("description must not be empty".to_string()),
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "description must not be empty");

        let err = ApiError::from_analysis(
            "Failed to process question",
            AnalysisError::Model(rag_analysis::LlmError::EmptyCompletion),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Failed to process question: "));
    }

    #[test]
    fn test_index_errors_carry_hints() {
        let err = ApiError::from(IndexError::PathNotFound("/x".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, ApiError::BadRequest { hint: Some(_), .. }));

        let err = ApiError::from(IndexError::NoDocuments);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "No documents found to index");
    }
}
