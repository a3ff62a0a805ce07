//! Indexing: load a source, chunk it, and store the chunks.
//!
//! Loading and cloning touch the filesystem and spawn `git`, so both run on
//! the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use repo_loader::{clone_repository, RepositoryLoader, SourceKind};
use serde::Serialize;
use tracing::{info, instrument};
use vector_state::{Document, VectorStore};

use crate::error::{IndexError, IndexResult};
use crate::obs;

/// Prefix for upload staging directories under the system temp dir
pub const UPLOAD_DIR_PREFIX: &str = "uploaded_file_";

/// What an index request stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexOutcome {
    pub source: SourceKind,
    pub documents: usize,
}

/// Indexes local paths, PDFs, GitHub repositories and uploaded files.
#[derive(Clone)]
pub struct RepositoryService {
    store: Arc<dyn VectorStore>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RepositoryService {
    pub fn new(store: Arc<dyn VectorStore>, chunk_size: usize, chunk_overlap: usize) -> Self {
        RepositoryService {
            store,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Index a local directory, a single file, or a GitHub URL.
    ///
    /// Local paths are checked before the loader runs. A clone is removed
    /// afterwards unless `cleanup` is false, in which case it is left on disk.
    #[instrument(skip(self))]
    pub async fn index_source(&self, source: &str, cleanup: bool) -> IndexResult<IndexOutcome> {
        let source = source.trim();
        let kind = SourceKind::classify(source);
        obs::emit_index_started(source, kind);
        let started = Instant::now();

        let result = match kind {
            SourceKind::GitHub => self.index_github(source, cleanup).await,
            SourceKind::PdfFile | SourceKind::LocalPath => {
                check_local_source(source)?;
                self.load_and_store(PathBuf::from(source)).await
            }
        };

        match result {
            Ok(documents) => {
                obs::emit_index_completed(
                    source,
                    kind,
                    documents,
                    started.elapsed().as_millis() as u64,
                );
                Ok(IndexOutcome {
                    source: kind,
                    documents,
                })
            }
            Err(e) => {
                obs::emit_index_failed(source, &e);
                Err(e)
            }
        }
    }

    /// Stage `contents` as `file_name` in a temporary directory, index it,
    /// then remove the staging directory.
    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn index_upload(&self, file_name: &str, contents: &[u8]) -> IndexResult<IndexOutcome> {
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| IndexError::UnsupportedSource("No file selected".to_string()))?;

        let staging = tempfile::Builder::new()
            .prefix(UPLOAD_DIR_PREFIX)
            .tempdir()?;
        let path = staging.path().join(&name);
        tokio::fs::write(&path, contents).await?;

        info!("Indexing uploaded file: {}", name);
        let kind = SourceKind::classify(&name);
        obs::emit_index_started(&name, kind);
        let started = Instant::now();
        let result = self.load_and_store(path).await;

        let staging_path = staging.path().display().to_string();
        if let Err(e) = staging.close() {
            obs::emit_cleanup_failed(&staging_path, &e);
        }

        match result {
            Ok(documents) => {
                obs::emit_index_completed(&name, kind, documents, started.elapsed().as_millis() as u64);
                Ok(IndexOutcome {
                    source: kind,
                    documents,
                })
            }
            Err(e) => {
                obs::emit_index_failed(&name, &e);
                Err(e)
            }
        }
    }

    async fn index_github(&self, url: &str, cleanup: bool) -> IndexResult<usize> {
        let owned = url.to_string();
        let checkout = tokio::task::spawn_blocking(move || clone_repository(&owned)).await??;
        let result = self.load_and_store(checkout.path().to_path_buf()).await;

        if cleanup {
            let path = checkout.path().display().to_string();
            if let Err(e) = tokio::task::spawn_blocking(move || checkout.cleanup()).await {
                obs::emit_cleanup_failed(&path, &e);
            }
        } else {
            let kept = checkout.persist();
            info!("Keeping cloned repository at {}", kept.display());
        }

        result
    }

    async fn load_and_store(&self, root: PathBuf) -> IndexResult<usize> {
        let documents = self.load(root).await?;
        if documents.is_empty() {
            return Err(IndexError::NoDocuments);
        }
        info!("Adding {} documents to vector store", documents.len());
        let stored = self.store.add_documents(&documents).await?;
        Ok(stored)
    }

    async fn load(&self, root: PathBuf) -> IndexResult<Vec<Document>> {
        let (size, overlap) = (self.chunk_size, self.chunk_overlap);
        let documents = tokio::task::spawn_blocking(move || {
            RepositoryLoader::new(root, size, overlap).and_then(|loader| loader.load())
        })
        .await??;
        Ok(documents)
    }
}

/// Reject non-GitHub URLs and missing paths before any loading happens.
pub fn check_local_source(source: &str) -> IndexResult<()> {
    if source.is_empty() {
        return Err(IndexError::UnsupportedSource(
            "repository_path must not be empty".to_string(),
        ));
    }
    let lower = source.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Err(IndexError::UnsupportedSource(format!(
            "Only GitHub URLs can be indexed remotely: {source}"
        )));
    }
    if !Path::new(source).exists() {
        return Err(IndexError::PathNotFound(source.to_string()));
    }
    Ok(())
}
