//! Repo-Loader: ingestion for repository intelligence
//!
//! Turns a local directory, a single file (PDFs included) or a GitHub URL
//! into chunked `Document`s ready for embedding.
//!
//! ## Layer 1 - Ingestion
//!
//! Focus: predictable chunk boundaries and source metadata.

mod error;
pub mod github;
mod loader;
pub mod pdf;
mod source;
pub mod splitter;

pub use error::{LoaderError, Result};
pub use github::{clone_repository, is_github_url, ClonedRepository};
pub use loader::{is_ignored, RepositoryLoader, IGNORED_EXTENSIONS, IGNORED_NAMES};
pub use source::SourceKind;
pub use splitter::{RecursiveSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
