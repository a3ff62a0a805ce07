//! Recursive character text splitter
//!
//! Splits on the first separator present in the text, recursing into pieces
//! that are still too long with the remaining separators, then greedily
//! merges adjacent pieces back up to `chunk_size` characters with
//! `chunk_overlap` characters carried over between chunks. Separators stay
//! attached to the start of the piece that follows them.

use std::collections::VecDeque;

use tracing::warn;
use vector_state::Document;

use crate::error::{LoaderError, Result};

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separators for source code and prose, coarsest first
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n\n", "\n\n", "\n", ". ", " ", ""];

/// Separators for PDF page text
pub const PDF_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Splitter with the default separators
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(LoaderError::InvalidChunking(
                "chunk size must be positive".to_string(),
            ));
        }
        if chunk_overlap > chunk_size {
            return Err(LoaderError::InvalidChunking(format!(
                "chunk overlap ({chunk_overlap}) is larger than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Splitter tuned for PDF pages
    pub fn for_pdf(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Ok(Self::new(chunk_size, chunk_overlap)?.with_separators(PDF_SEPARATORS))
    }

    pub fn with_separators(mut self, separators: &[&str]) -> Self {
        self.separators = separators.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into trimmed, non-empty chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every document, copying its metadata onto each chunk
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .map(move |text| Document {
                        text,
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }
        chunks
    }

    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }
                if !window.is_empty() {
                    push_joined(&mut chunks, &window);
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match window.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }
        push_joined(&mut chunks, &window);
        chunks
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, keeping each separator at the start of the piece
/// that follows it. Empty pieces are dropped.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(text[start..idx].to_string());
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveSplitter::default();
        assert_eq!(splitter.split_text("  fn main() {}  "), vec!["fn main() {}"]);
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        let splitter = RecursiveSplitter::default();
        assert!(splitter.split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_separator_kept_at_start_of_next_piece() {
        let splitter = RecursiveSplitter::new(12, 0).unwrap();
        let chunks = splitter.split_text("alpha. beta. gamma");
        assert_eq!(chunks, vec!["alpha. beta", ". gamma"]);
    }

    #[test]
    fn test_paragraphs_split_before_lines() {
        let splitter = RecursiveSplitter::new(6, 0).unwrap();
        let chunks = splitter.split_text("aaaa\n\nbbbb");
        assert_eq!(chunks, vec!["aaaa", "bbbb"]);
    }

    #[test]
    fn test_overlap_carries_trailing_words() {
        let splitter = RecursiveSplitter::new(5, 2).unwrap();
        let chunks = splitter.split_text("a b c d e f");
        assert_eq!(chunks, vec!["a b c", "c d", "d e", "e f"]);
    }

    #[test]
    fn test_chunks_respect_size_in_chars() {
        let splitter = RecursiveSplitter::new(20, 5).unwrap();
        let text = "über straße café naïve résumé ".repeat(20);
        for chunk in splitter.split_text(&text) {
            assert!(chunk.chars().count() <= 20, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = RecursiveSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(RecursiveSplitter::new(0, 0).is_err());
        assert!(RecursiveSplitter::new(10, 11).is_err());
    }

    #[test]
    fn test_split_documents_copies_metadata() {
        let splitter = RecursiveSplitter::new(5, 0).unwrap();
        let doc = Document::new("aaaa bbbb").with_metadata("file_path", "src/lib.rs");
        let chunks = splitter.split_documents(&[doc]);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.source_path() == "src/lib.rs"));
    }
}
