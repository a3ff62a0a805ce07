//! Repo-Intel Server: HTTP surface for repository intelligence
//!
//! JSON endpoints under `/api/v1` plus `GET /`. Bodies arrive as raw bytes
//! and are decoded here, so malformed input always gets the JSON error body
//! rather than an extractor rejection.

mod error;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rag_analysis::{ChangeRequest, QuestionRequest};
use repo_intel_core::{RepoIntel, VERSION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

pub use error::ApiError;

/// Upper bound on multipart uploads
pub const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

pub const SERVICE_NAME: &str = "repository-intelligence";

type ApiResult = Result<Json<Value>, ApiError>;

/// Build the application router over shared services.
pub fn router(app: RepoIntel) -> Router {
    let api = Router::new()
        .route("/question", post(ask_question))
        .route("/validate", post(validate_change))
        .route("/impact", post(analyze_impact))
        .route("/analyze", post(full_analysis))
        .route("/index", post(index_repository))
        .route(
            "/index/file",
            post(index_file).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/health", get(health));

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", api)
        .with_state(app)
}

// ---------------------------------------------------------------------------
// Body decoding
// ---------------------------------------------------------------------------

/// Decode a JSON body. Missing, empty and `{}` bodies are all "required".
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let value = parse_value(body)?;
    if value.as_object().is_some_and(|map| map.is_empty()) {
        return Err(ApiError::bad_request("Request body is required"));
    }
    from_value(value)
}

/// Decode a JSON body, letting `{}` through for handlers that report the
/// missing field themselves.
fn parse_value(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("Request body is required"));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON request: {e}")))?;
    if value.is_null() {
        return Err(ApiError::bad_request("Request body is required"));
    }
    Ok(value)
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(format!("Validation error: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> ApiResult {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| ApiError::internal(format!("Failed to encode response: {e}")))
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

async fn ask_question(State(app): State<RepoIntel>, body: Bytes) -> ApiResult {
    let request: QuestionRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|e| ApiError::from_analysis("Failed to answer question", e))?;
    let response = app
        .analysis
        .answer_question(&request)
        .await
        .map_err(|e| ApiError::from_analysis("Failed to answer question", e))?;
    to_json(&response)
}

async fn validate_change(State(app): State<RepoIntel>, body: Bytes) -> ApiResult {
    let request = change_request(&body)?;
    let response = app
        .analysis
        .validate_change(&request)
        .await
        .map_err(|e| ApiError::from_analysis("Failed to validate change", e))?;
    to_json(&response)
}

async fn analyze_impact(State(app): State<RepoIntel>, body: Bytes) -> ApiResult {
    let request = change_request(&body)?;
    let response = app
        .analysis
        .analyze_impact(&request)
        .await
        .map_err(|e| ApiError::from_analysis("Failed to analyze impact", e))?;
    to_json(&response)
}

async fn full_analysis(State(app): State<RepoIntel>, body: Bytes) -> ApiResult {
    let request = change_request(&body)?;
    let response = app
        .analysis
        .full_analysis(&request)
        .await
        .map_err(|e| ApiError::from_analysis("Failed to perform analysis", e))?;
    to_json(&response)
}

fn change_request(body: &Bytes) -> Result<ChangeRequest, ApiError> {
    let request: ChangeRequest = parse_body(body)?;
    request
        .validate()
        .map_err(|e| ApiError::from_analysis("Invalid change request", e))?;
    Ok(request)
}

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

fn default_cleanup() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct IndexRequest {
    #[serde(default)]
    repository_path: Option<String>,
    #[serde(default = "default_cleanup")]
    cleanup: bool,
}

async fn index_repository(State(app): State<RepoIntel>, body: Bytes) -> ApiResult {
    let request: IndexRequest = from_value(parse_value(&body)?)?;
    let path = request
        .repository_path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("repository_path is required"))?;

    info!("Indexing request: {}", path);
    let outcome = app.repository.index_source(&path, request.cleanup).await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Successfully indexed: {path}"),
        "source": outcome.source.label(),
        "documents": outcome.documents,
    })))
}

async fn index_file(
    State(app): State<RepoIntel>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    let mut multipart =
        multipart.map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let contents = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid upload: {e}")))?;
        upload = Some((file_name, contents));
        break;
    }

    let (file_name, contents) = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if file_name.trim().is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }

    let outcome = app.repository.index_upload(&file_name, &contents).await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Successfully indexed file: {file_name}"),
        "source": outcome.source.label(),
        "documents": outcome.documents,
    })))
}

// ---------------------------------------------------------------------------
// Service info
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": SERVICE_NAME}))
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Repository Intelligence Backend",
        "version": VERSION,
        "status": "running",
    }))
}
