//! Classification of index sources.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::github::is_github_url;

/// What kind of thing an index request points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "GitHub URL")]
    GitHub,
    #[serde(rename = "PDF file")]
    PdfFile,
    #[serde(rename = "Local path")]
    LocalPath,
}

impl SourceKind {
    pub fn classify(source: &str) -> Self {
        if is_github_url(source) {
            SourceKind::GitHub
        } else if source.to_lowercase().ends_with(".pdf") {
            SourceKind::PdfFile
        } else {
            SourceKind::LocalPath
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::GitHub => "GitHub URL",
            SourceKind::PdfFile => "PDF file",
            SourceKind::LocalPath => "Local path",
        }
    }

    /// Sources read straight from the local filesystem
    pub fn is_local(&self) -> bool {
        !matches!(self, SourceKind::GitHub)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            SourceKind::classify("https://github.com/acme/billing"),
            SourceKind::GitHub
        );
        assert_eq!(SourceKind::classify("/docs/Policy.PDF"), SourceKind::PdfFile);
        assert_eq!(SourceKind::classify("./services/claims"), SourceKind::LocalPath);
    }

    #[test]
    fn test_wire_label() {
        let json = serde_json::to_string(&SourceKind::PdfFile).unwrap();
        assert_eq!(json, "\"PDF file\"");
        assert_eq!(SourceKind::GitHub.to_string(), "GitHub URL");
    }
}
