//! Repo-Intel Core: settings, tracing and service wiring
//!
//! Glues the storage, ingestion and analysis layers together for the server
//! and CLI binaries.
//!
//! ## Key Components
//!
//! - `Settings`: environment-driven configuration (`.env` aware)
//! - `RepoIntel`: builds every collaborator once and hands out `Arc`s
//! - `RepositoryService`: indexing of paths, PDFs, GitHub URLs and uploads
//! - `init_tracing`: global subscriber setup

mod app;
mod error;
pub mod indexing;
pub mod obs;
pub mod settings;
pub mod telemetry;

pub use app::RepoIntel;
pub use error::{IndexError, IndexResult, SettingsError};
pub use indexing::{check_local_source, IndexOutcome, RepositoryService, UPLOAD_DIR_PREFIX};
pub use settings::{LogFormat, Settings, VectorBackend};
pub use telemetry::{init_from_settings, init_tracing};

/// Crate version, reported by `GET /`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
