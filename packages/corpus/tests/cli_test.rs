//! Integration tests for the command-line interface.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_constitution-corpus"));
    cmd.env_remove("CORPUS_FALLBACK_TOLERANCE")
        .env_remove("CORPUS_DOCUMENT_TITLE")
        .env_remove("CORPUS_OVERRIDES")
        .env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_extract_writes_records() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("articles");

    cli()
        .arg("extract")
        .arg(fixture("constitution.txt"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Articles: 7"));

    assert!(output.join("chapter_4").join("article_48.json").is_file());
    assert!(output.join("chapter_6A").join("article_64A.json").is_file());
}

#[test]
fn test_extract_missing_input_fails() {
    let dir = tempdir().unwrap();

    cli()
        .arg("extract")
        .arg(dir.path().join("missing.txt"))
        .arg("-o")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Failed to read"));
}

#[test]
fn test_extract_strict_rejects_duplicates() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("dup.txt");
    fs::write(
        &input,
        "CHAPTER I\nONE\n\n1. First. Body.\n\nCHAPTER II\nTWO\n\n1. Again. Body.\n",
    )
    .unwrap();

    cli()
        .arg("extract")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("articles"))
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate article 1"));

    cli()
        .arg("extract")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("articles"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings: 1"));
}

#[test]
fn test_run_extracts_and_resolves() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("articles");

    cli()
        .arg("run")
        .arg(fixture("constitution.txt"))
        .arg(fixture("constitution_toc.json"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Document: Constitution of Malta"))
        .stdout(predicate::str::contains("Indexed articles: 9"))
        .stdout(predicate::str::contains("Records: 7"));
}

#[test]
fn test_resolve_rejects_out_of_range_tolerance() {
    let dir = tempdir().unwrap();

    cli()
        .arg("resolve")
        .arg(fixture("constitution_toc.json"))
        .arg("-o")
        .arg(dir.path())
        .arg("--tolerance")
        .arg("99")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid fallback tolerance: 99"));
}

#[test]
fn test_resolve_malformed_toc_fails() {
    let dir = tempdir().unwrap();
    let toc = dir.path().join("toc.json");
    fs::write(&toc, "{ broken").unwrap();

    cli()
        .arg("resolve")
        .arg(&toc)
        .arg("-o")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON error"));
}

#[test]
fn test_clean_yes_removes_only_chapter_dirs() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("articles");

    cli()
        .arg("extract")
        .arg(fixture("constitution.txt"))
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    fs::create_dir_all(output.join("notes")).unwrap();

    cli()
        .arg("clean")
        .arg("-o")
        .arg(&output)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    assert!(!output.join("chapter_1").exists());
    assert!(!output.join("chapter_10").exists());
    assert!(output.join("notes").is_dir());
}

#[test]
fn test_clean_without_chapter_dirs() {
    let dir = tempdir().unwrap();

    cli()
        .arg("clean")
        .arg("-o")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No chapter directories found"));
}
