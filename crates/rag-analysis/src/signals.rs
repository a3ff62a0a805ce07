//! Module and dependency signals derived from evidence.

use std::collections::BTreeSet;

/// Cap on dependency lines reported per analysis
pub const MAX_DEPENDENCIES: usize = 10;

/// Keywords that mark a dependency line in question answering
pub const QA_DEPENDENCY_KEYWORDS: &[&str] = &["import", "from", "depends", "requires", "uses"];

/// Keywords that mark a dependency line in change validation
pub const IMPORT_KEYWORDS: &[&str] = &["import", "from"];

/// How dependency keywords are matched against a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMatch {
    CaseSensitive,
    CaseInsensitive,
}

/// First path segment of every multi-segment source path.
pub fn related_modules<'a>(file_paths: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
    file_paths
        .into_iter()
        .filter_map(|path| {
            let mut parts = path.split('/');
            let first = parts.next()?;
            parts.next()?;
            (!first.is_empty()).then(|| first.to_string())
        })
        .collect()
}

/// Trimmed lines containing any keyword, sorted, at most [`MAX_DEPENDENCIES`].
pub fn dependency_lines<'a>(
    chunks: impl IntoIterator<Item = &'a String>,
    keywords: &[&str],
    matching: KeywordMatch,
) -> Vec<String> {
    let mut lines = BTreeSet::new();
    for chunk in chunks {
        for line in chunk.split('\n') {
            let hit = match matching {
                KeywordMatch::CaseSensitive => keywords.iter().any(|k| line.contains(k)),
                KeywordMatch::CaseInsensitive => {
                    let lower = line.to_lowercase();
                    keywords.iter().any(|k| lower.contains(k))
                }
            };
            if hit {
                lines.insert(line.trim().to_string());
            }
        }
    }
    lines.into_iter().take(MAX_DEPENDENCIES).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modules_from_multi_segment_paths() {
        let paths = vec![
            "billing/api/refunds.py".to_string(),
            "billing/models.py".to_string(),
            "claims/core.py".to_string(),
            "README.md".to_string(),
            "unknown".to_string(),
        ];
        let modules: Vec<String> = related_modules(&paths).into_iter().collect();
        assert_eq!(modules, vec!["billing", "claims"]);
    }

    #[test]
    fn test_leading_slash_yields_no_empty_module() {
        let paths = vec!["/abs/path.py".to_string()];
        assert!(related_modules(&paths).is_empty());
    }

    #[test]
    fn test_dependency_lines_case_insensitive() {
        let chunks = vec![
            "Import os\nx = 1\n  from billing import api  ".to_string(),
            "The service Requires auth".to_string(),
        ];
        let deps = dependency_lines(&chunks, QA_DEPENDENCY_KEYWORDS, KeywordMatch::CaseInsensitive);
        assert_eq!(
            deps,
            vec!["Import os", "The service Requires auth", "from billing import api"]
        );
    }

    #[test]
    fn test_dependency_lines_case_sensitive() {
        let chunks = vec!["Import os\nimport sys\nFROM x".to_string()];
        let deps = dependency_lines(&chunks, IMPORT_KEYWORDS, KeywordMatch::CaseSensitive);
        assert_eq!(deps, vec!["import sys"]);
    }

    #[test]
    fn test_dependency_lines_capped_and_deduplicated() {
        let chunk: String = (0..15).map(|i| format!("import mod{i:02}\n")).collect();
        let chunks = vec![chunk.clone(), chunk];
        let deps = dependency_lines(&chunks, IMPORT_KEYWORDS, KeywordMatch::CaseSensitive);
        assert_eq!(deps.len(), MAX_DEPENDENCIES);
        assert_eq!(deps[0], "import mod00");
        assert_eq!(deps[9], "import mod09");
    }
}
