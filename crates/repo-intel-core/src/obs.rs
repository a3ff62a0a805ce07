//! Structured events for the indexing lifecycle.
//!
//! Same convention as the analysis events: `info!` with an `event` field,
//! failures at `warn!`.

use repo_loader::SourceKind;
use tracing::{info, warn};

/// Emit event: indexing accepted a source.
pub fn emit_index_started(source: &str, kind: SourceKind) {
    info!(event = "index.started", source = %source, kind = %kind);
}

/// Emit event: documents chunked and stored.
pub fn emit_index_completed(source: &str, kind: SourceKind, documents: usize, duration_ms: u64) {
    info!(
        event = "index.completed",
        source = %source,
        kind = %kind,
        documents = documents,
        duration_ms = duration_ms,
    );
}

/// Emit event: indexing failed (warning level).
pub fn emit_index_failed(source: &str, error: &dyn std::fmt::Display) {
    warn!(event = "index.failed", source = %source, error = %error);
}

/// Emit event: a temporary checkout or upload could not be removed.
pub fn emit_cleanup_failed(path: &str, error: &dyn std::fmt::Display) {
    warn!(event = "index.cleanup_failed", path = %path, error = %error);
}
