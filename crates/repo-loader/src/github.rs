//! GitHub repository cloning.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::{LoaderError, Result};

/// Prefix for clone directories under the system temp dir
pub const CLONE_DIR_PREFIX: &str = "github_repo_";

/// Whether a source string should be cloned rather than read from disk.
pub fn is_github_url(source: &str) -> bool {
    source.to_lowercase().contains("github.com") || source.ends_with(".git")
}

/// Clone URL for a source, appending `.git` to bare GitHub URLs.
pub fn clone_url(source: &str) -> Result<String> {
    if source.ends_with(".git") {
        Ok(source.to_string())
    } else if source.to_lowercase().contains("github.com") {
        Ok(format!("{source}.git"))
    } else {
        Err(LoaderError::UnsupportedSource(format!(
            "Invalid GitHub URL: {source}"
        )))
    }
}

/// A repository cloned into a temporary directory.
///
/// Dropping it removes the directory; `cleanup` does the same but logs
/// failures, and `persist` keeps the checkout on disk.
#[derive(Debug)]
pub struct ClonedRepository {
    dir: TempDir,
    url: String,
}

impl ClonedRepository {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Remove the checkout. Failure is logged, never returned.
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        info!("Cleaning up temporary directory: {}", path.display());
        if let Err(e) = self.dir.close() {
            warn!("Failed to cleanup temp directory {}: {}", path.display(), e);
        }
    }

    /// Keep the checkout on disk and return its path.
    pub fn persist(self) -> PathBuf {
        self.dir.into_path()
    }
}

/// Clone `source` with `git clone` into a fresh temporary directory.
pub fn clone_repository(source: &str) -> Result<ClonedRepository> {
    let url = clone_url(source)?;
    let dir = tempfile::Builder::new()
        .prefix(CLONE_DIR_PREFIX)
        .tempdir()?;

    info!("Cloning {} to {}", url, dir.path().display());

    let output = Command::new("git")
        .args(["clone", "--quiet", &url])
        .arg(dir.path())
        .output()
        .map_err(|e| LoaderError::CloneFailed(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LoaderError::CloneFailed(format!(
            "git clone {url} failed: {}",
            stderr.trim()
        )));
    }

    info!("Successfully cloned repository to {}", dir.path().display());
    Ok(ClonedRepository { dir, url })
}
