// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end CLI tests: index a small document, query it, and exercise the
//! maintenance commands. The dummy embedding provider keeps these offline.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();

    std::fs::write(
        dir.path().join(".docfindrc.toml"),
        r#"
[embeddings]
provider = "dummy"
dimension = 4

[store]
path = "db.sqlite"
"#,
    )
    .unwrap();

    std::fs::write(
        dir.path().join("pages.json"),
        r#"[
            {"page": 1, "text": "Rust is a systems programming language. It is fast."},
            {"page": 2, "text": "Cats are small carnivorous mammals."}
        ]"#,
    )
    .unwrap();

    dir
}

fn docfind(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docfind").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

fn index(dir: &TempDir) {
    docfind(dir)
        .args(["index", "pages.json", "--source", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed"));
}

#[test]
fn index_then_query_returns_documents() {
    let dir = setup_workspace();
    index(&dir);

    let output = docfind(&dir)
        .args(["query", "systems programming", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let docs = response["retrieved_docs"].as_array().unwrap();
    assert!(!docs.is_empty());
    assert!(docs[0]["metadata"]["id"]
        .as_str()
        .unwrap()
        .starts_with("doc:demo:"));
    // Scores are omitted unless requested.
    assert!(docs[0].get("score").is_none());
}

#[test]
fn query_with_scores_includes_them() {
    let dir = setup_workspace();
    index(&dir);

    let output = docfind(&dir)
        .args(["query", "anything", "--scores", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let docs = response["retrieved_docs"].as_array().unwrap();
    assert!(docs[0]["score"].is_number());
}

#[test]
fn query_against_empty_corpus_reports_no_matches() {
    let dir = setup_workspace();

    docfind(&dir)
        .args(["query", "anything"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching documents."));
}

#[test]
fn blank_query_is_rejected() {
    let dir = setup_workspace();

    docfind(&dir)
        .args(["query", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid request"));
}

#[test]
fn unsupported_search_type_is_rejected() {
    let dir = setup_workspace();
    index(&dir);

    docfind(&dir)
        .args(["query", "rust", "--search-type", "mmr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("similarity"));
}

#[test]
fn health_reports_model_and_status() {
    let dir = setup_workspace();
    index(&dir);

    let output = docfind(&dir)
        .args(["health", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["status"], "healthy");
    assert_eq!(report["model"], "dummy");
    assert_eq!(report["dimension"], 4);
    assert!(report["documents"].as_u64().unwrap() > 0);
}

#[test]
fn stats_shows_document_count() {
    let dir = setup_workspace();
    index(&dir);

    docfind(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("documents:"))
        .stdout(predicate::str::contains("dummy"));
}

#[test]
fn clear_requires_confirmation() {
    let dir = setup_workspace();
    index(&dir);

    docfind(&dir)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    docfind(&dir)
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    docfind(&dir)
        .args(["query", "anything"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching documents."));
}

#[test]
fn reindexing_does_not_duplicate_records() {
    let dir = setup_workspace();
    index(&dir);

    let count = |dir: &TempDir| -> u64 {
        let output = docfind(dir)
            .args(["stats", "--format", "json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let stats: serde_json::Value = serde_json::from_slice(&output).unwrap();
        stats["documents"].as_u64().unwrap()
    };

    let first = count(&dir);
    index(&dir);
    assert_eq!(count(&dir), first);
}
