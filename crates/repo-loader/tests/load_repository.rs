//! Integration tests for directory and single-file loading.

use std::fs;

use repo_loader::{LoaderError, RepositoryLoader};

fn write(root: &std::path::Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn directory_walk_attaches_relative_metadata() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "billing/api.py", b"import stripe\n\ndef refund():\n    pass\n");
    write(dir.path(), "README.md", b"# Billing service\n");

    let loader = RepositoryLoader::new(dir.path(), 1000, 200).unwrap();
    let docs = loader.load().unwrap();

    let mut paths: Vec<&str> = docs.iter().map(|d| d.source_path()).collect();
    paths.sort();
    assert_eq!(paths, vec!["README.md", "billing/api.py"]);

    let api = docs
        .iter()
        .find(|d| d.source_path() == "billing/api.py")
        .unwrap();
    assert_eq!(api.metadata["file_name"], "api.py");
    assert_eq!(api.metadata["file_type"], ".py");
    assert!(api.text.contains("def refund"));
}

#[test]
fn directory_walk_skips_ignored_entries() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/main.py", b"print('hi')\n");
    write(dir.path(), "node_modules/left-pad/index.js", b"module.exports = 1;\n");
    write(dir.path(), ".git/config", b"[core]\n");
    write(dir.path(), "src/__pycache__/main.cpython-311.pyc", b"\x00\x01");
    write(dir.path(), "src/stale.pyc", b"bytecode");
    write(dir.path(), ".env", b"SECRET=1\n");

    let loader = RepositoryLoader::new(dir.path(), 1000, 200).unwrap();
    let docs = loader.load().unwrap();

    let paths: Vec<&str> = docs.iter().map(|d| d.source_path()).collect();
    assert_eq!(paths, vec!["src/main.py"]);
}

#[test]
fn binary_files_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "logo.png", &[0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe, 0x00]);
    write(dir.path(), "notes.txt", b"release notes\n");

    let loader = RepositoryLoader::new(dir.path(), 1000, 200).unwrap();
    let docs = loader.load().unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].source_path(), "notes.txt");
}

#[test]
fn long_files_are_chunked() {
    let dir = tempfile::tempdir().unwrap();
    let body = "line of repository text\n".repeat(100);
    write(dir.path(), "big.txt", body.as_bytes());

    let loader = RepositoryLoader::new(dir.path(), 200, 50).unwrap();
    let docs = loader.load().unwrap();

    assert!(docs.len() > 1);
    assert!(docs.iter().all(|d| d.text.chars().count() <= 200));
    assert!(docs.iter().all(|d| d.source_path() == "big.txt"));
}

#[test]
fn single_file_uses_file_name_and_chunk_indices() {
    let dir = tempfile::tempdir().unwrap();
    let body = "Paragraph about claims.\n\n".repeat(30);
    write(dir.path(), "docs/policy.md", body.as_bytes());
    let file = dir.path().join("docs/policy.md");

    let loader = RepositoryLoader::new(&file, 100, 20).unwrap();
    let docs = loader.load().unwrap();

    assert!(docs.len() > 1);
    let total = docs.len() as u64;
    for (i, doc) in docs.iter().enumerate() {
        assert_eq!(doc.source_path(), "policy.md");
        assert_eq!(doc.metadata["page"], 1);
        assert_eq!(doc.metadata["chunk_index"], i as u64);
        assert_eq!(doc.metadata["total_chunks"], total);
        assert_eq!(
            doc.metadata["source"],
            file.to_string_lossy().to_string().as_str()
        );
    }
}

#[test]
fn missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let loader = RepositoryLoader::new(dir.path().join("nope"), 1000, 200).unwrap();
    assert!(matches!(loader.load(), Err(LoaderError::PathNotFound(_))));
}

#[test]
fn empty_directory_yields_no_documents() {
    let dir = tempfile::tempdir().unwrap();
    let loader = RepositoryLoader::new(dir.path(), 1000, 200).unwrap();
    assert!(loader.load().unwrap().is_empty());
}
