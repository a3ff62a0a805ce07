//! Error types for repo-loader

use thiserror::Error;

/// Errors that can occur while loading repository content
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Source path does not exist
    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    /// Source string is neither a local path nor a GitHub URL
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// git executable missing or clone failed
    #[error("Git clone failed: {0}")]
    CloneFailed(String),

    /// pdftotext missing or extraction failed
    #[error("PDF extraction failed: {0}")]
    PdfExtraction(String),

    /// Invalid splitter settings
    #[error("Invalid chunking configuration: {0}")]
    InvalidChunking(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;
