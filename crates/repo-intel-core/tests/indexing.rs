//! Indexing service tests over the in-memory vector store.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use rag_analysis::fakes::ScriptedModel;
use rag_analysis::QuestionRequest;
use repo_intel_core::{IndexError, RepoIntel, RepositoryService, Settings};
use repo_loader::SourceKind;
use vector_state::fakes::MemoryVectorStore;

fn service(store: &Arc<MemoryVectorStore>) -> RepositoryService {
    RepositoryService::new(store.clone(), 1000, 200)
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

#[tokio::test]
async fn indexes_local_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "billing/api.py", "def refund(): pass\n");
    write(dir.path(), "README.md", "# Billing\n");
    write(dir.path(), "node_modules/x/index.js", "ignored");

    let store = Arc::new(MemoryVectorStore::new());
    let outcome = service(&store)
        .index_source(&dir.path().display().to_string(), true)
        .await
        .unwrap();

    assert_eq!(outcome.source, SourceKind::LocalPath);
    assert_eq!(outcome.documents, 2);
    assert_eq!(store.len(), 2);
    let paths: Vec<String> = store
        .documents()
        .iter()
        .map(|d| d.source_path().to_string())
        .collect();
    assert!(paths.contains(&"billing/api.py".to_string()));
}

#[tokio::test]
async fn missing_path_is_client_error() {
    let store = Arc::new(MemoryVectorStore::new());
    let err = service(&store)
        .index_source("/no/such/repository", true)
        .await
        .unwrap_err();

    assert!(matches!(err, IndexError::PathNotFound(_)));
    assert!(err.is_client_error());
    assert!(store.is_empty());
}

#[tokio::test]
async fn non_github_url_is_rejected() {
    let store = Arc::new(MemoryVectorStore::new());
    let err = service(&store)
        .index_source("https://example.com/repo", true)
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn empty_directory_has_nothing_to_index() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryVectorStore::new());
    let err = service(&store)
        .index_source(&dir.path().display().to_string(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, IndexError::NoDocuments));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn upload_is_indexed_under_its_file_name() {
    let store = Arc::new(MemoryVectorStore::new());
    let outcome = service(&store)
        .index_upload("notes.txt", b"refund policy: 30 days")
        .await
        .unwrap();

    assert_eq!(outcome.source, SourceKind::LocalPath);
    assert_eq!(outcome.documents, 1);
    let doc = &store.documents()[0];
    assert_eq!(doc.source_path(), "notes.txt");
    assert_eq!(doc.metadata["chunk_index"], 0);
    assert_eq!(doc.metadata["total_chunks"], 1);
}

#[tokio::test]
async fn upload_name_is_reduced_to_its_last_component() {
    let store = Arc::new(MemoryVectorStore::new());
    service(&store)
        .index_upload("../../etc/notes.md", b"# hello")
        .await
        .unwrap();
    assert_eq!(store.documents()[0].source_path(), "notes.md");

    let err = service(&store).index_upload("", b"x").await.unwrap_err();
    assert!(err.is_client_error());
}

fn git(dir: &Path, args: &[&str]) {
    let out = Command::new("git").args(args).current_dir(dir).output().unwrap();
    assert!(out.status.success(), "git {:?}: {}", args, String::from_utf8_lossy(&out.stderr));
}

#[tokio::test]
async fn clones_dot_git_source() {
    let parent = tempfile::tempdir().unwrap();
    let repo = parent.path().join("fixture.git");
    fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "--quiet"]);
    git(&repo, &["config", "user.email", "dev@example.com"]);
    git(&repo, &["config", "user.name", "Dev"]);
    write(&repo, "src/lib.rs", "pub fn refund() {}\n");
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "--quiet", "-m", "init"]);

    let store = Arc::new(MemoryVectorStore::new());
    let outcome = service(&store)
        .index_source(&repo.display().to_string(), true)
        .await
        .unwrap();

    assert_eq!(outcome.source, SourceKind::GitHub);
    assert_eq!(outcome.documents, 1);
    assert_eq!(store.documents()[0].source_path(), "src/lib.rs");
}

#[tokio::test]
async fn wired_services_share_one_store() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "billing/api.py", "def refund(): pass\n");

    let settings = Settings::from_lookup(|_| None).unwrap();
    let store = Arc::new(MemoryVectorStore::new());
    let model = Arc::new(ScriptedModel::new().with_default("in billing"));
    let app = RepoIntel::with_components(settings, store.clone(), model);

    app.repository
        .index_source(&dir.path().display().to_string(), true)
        .await
        .unwrap();
    let answer = app
        .analysis
        .answer_question(&QuestionRequest::new("where is refund?"))
        .await
        .unwrap();

    assert_eq!(answer.repository_evidence.file_paths, vec!["billing/api.py"]);
    assert!(answer.analysis.related_modules.contains("billing"));
}
