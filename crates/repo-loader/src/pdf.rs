//! PDF text extraction via `pdftotext` (poppler-utils)

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{LoaderError, Result};

/// Extract text from a PDF, one entry per page.
pub fn extract_pages(path: &Path) -> Result<Vec<String>> {
    let output = Command::new("pdftotext")
        .args(["-enc", "UTF-8"])
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| LoaderError::PdfExtraction(format!("failed to run pdftotext: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LoaderError::PdfExtraction(format!(
            "pdftotext failed for {}: {}",
            path.display(),
            stderr.trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let pages = split_pages(&text);
    debug!("Extracted {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// pdftotext ends every page with a form feed
pub(crate) fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Whether pdftotext is available on PATH
pub fn is_available() -> bool {
    Command::new("pdftotext")
        .arg("-v")
        .output()
        .map(|_| true)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_drops_trailing_form_feed() {
        let pages = split_pages("first page\n\x0csecond page\n\x0c");
        assert_eq!(pages, vec!["first page\n", "second page\n"]);
    }

    #[test]
    fn test_split_pages_keeps_blank_inner_pages() {
        let pages = split_pages("one\x0c\x0cthree\x0c");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1], "");
    }

    #[test]
    fn test_missing_file_is_extraction_error() {
        if !is_available() {
            return;
        }
        let err = extract_pages(Path::new("/nonexistent/file.pdf")).unwrap_err();
        assert!(matches!(err, LoaderError::PdfExtraction(_)));
    }
}
