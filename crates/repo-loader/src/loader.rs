//! Repository and single-file loading.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vector_state::Document;
use walkdir::WalkDir;

use crate::error::{LoaderError, Result};
use crate::pdf;
use crate::splitter::RecursiveSplitter;

/// Directory and file names never indexed
pub const IGNORED_NAMES: &[&str] = &[
    "__pycache__",
    ".git",
    ".venv",
    "venv",
    "node_modules",
    ".pytest_cache",
    ".mypy_cache",
    "chroma_db",
    ".env",
    ".DS_Store",
];

/// Compiled-Python extensions never indexed
pub const IGNORED_EXTENSIONS: &[&str] = &["pyc", "pyo", "pyd"];

/// Whether a single path component should be skipped
pub fn is_ignored(name: &str) -> bool {
    if IGNORED_NAMES.contains(&name) {
        return true;
    }
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IGNORED_EXTENSIONS.contains(&ext))
}

/// Loads a directory tree or a single file into chunked documents.
#[derive(Debug, Clone)]
pub struct RepositoryLoader {
    root: PathBuf,
    text_splitter: RecursiveSplitter,
    pdf_splitter: RecursiveSplitter,
}

impl RepositoryLoader {
    pub fn new(root: impl Into<PathBuf>, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            text_splitter: RecursiveSplitter::new(chunk_size, chunk_overlap)?,
            pdf_splitter: RecursiveSplitter::for_pdf(chunk_size, chunk_overlap)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load and chunk everything under the root.
    pub fn load(&self) -> Result<Vec<Document>> {
        if !self.root.exists() {
            return Err(LoaderError::PathNotFound(self.root.display().to_string()));
        }
        if self.root.is_file() {
            return self.load_single_file(&self.root);
        }
        self.load_directory()
    }

    fn load_directory(&self) -> Result<Vec<Document>> {
        info!("Loading repository from: {}", self.root.display());

        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            match read_sections(path) {
                Ok(sections) => {
                    for section in sections {
                        let mut doc = base_document(path, section.text)
                            .with_metadata("file_path", relative.as_str());
                        if let Some(page) = section.page {
                            doc = doc.with_metadata("page", page);
                        }
                        documents.push(doc);
                    }
                    debug!("Loaded: {}", relative);
                }
                Err(e) => {
                    warn!("Failed to load {}: {}", path.display(), e);
                }
            }
        }

        info!("Loaded {} documents", documents.len());
        let chunks = self.text_splitter.split_documents(&documents);
        info!("Split into {} chunks", chunks.len());
        Ok(chunks)
    }

    fn load_single_file(&self, path: &Path) -> Result<Vec<Document>> {
        let file_name = file_name(path);
        info!("Loading single file: {}", file_name);

        let sections = read_sections(path)?;
        info!("Loaded {} pages/sections from {}", sections.len(), file_name);

        let documents: Vec<Document> = sections
            .into_iter()
            .enumerate()
            .map(|(i, section)| {
                base_document(path, section.text)
                    .with_metadata("file_path", file_name.as_str())
                    .with_metadata("page", section.page.unwrap_or(i + 1))
            })
            .collect();

        let mut chunks = if is_pdf(path) {
            info!("Using PDF-optimized chunking");
            self.pdf_splitter.split_documents(&documents)
        } else {
            self.text_splitter.split_documents(&documents)
        };

        let total = chunks.len();
        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.metadata.insert("chunk_index".to_string(), i.into());
            chunk.metadata.insert("total_chunks".to_string(), total.into());
        }

        info!("Split {} into {} chunks", file_name, total);
        Ok(chunks)
    }
}

struct Section {
    text: String,
    page: Option<usize>,
}

fn read_sections(path: &Path) -> Result<Vec<Section>> {
    if is_pdf(path) {
        let pages = pdf::extract_pages(path)?;
        return Ok(pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| Section {
                text,
                page: Some(i + 1),
            })
            .collect());
    }

    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, format!("not UTF-8 text: {e}"))
    })?;
    Ok(vec![Section { text, page: None }])
}

fn base_document(path: &Path, text: String) -> Document {
    Document::new(text)
        .with_metadata("file_name", file_name(path))
        .with_metadata("file_type", file_type(path))
        .with_metadata("source", path.to_string_lossy().to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Extension with its leading dot, as written (".py", ".PDF", "")
fn file_type(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ignored() {
        assert!(is_ignored("node_modules"));
        assert!(is_ignored(".git"));
        assert!(is_ignored("module.cpython-311.pyc"));
        assert!(!is_ignored("main.py"));
        assert!(!is_ignored(".github"));
        assert!(!is_ignored(".envrc"));
    }

    #[test]
    fn test_file_type_keeps_dot_and_case() {
        assert_eq!(file_type(Path::new("a/b/main.py")), ".py");
        assert_eq!(file_type(Path::new("Makefile")), "");
        assert!(is_pdf(Path::new("Guide.PDF")));
    }
}
