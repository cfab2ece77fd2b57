//! End-to-end CLI tests for the chartfetch binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod support;
use support::catalog_fixtures::{
    INDEX_ROUTE, document_item, folder_link, page, serve_chart, serve_html, serve_status,
};
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("chartfetch").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VFR chart catalog"))
        .stdout(predicate::str::contains("--preset"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("chartfetch").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chartfetch"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("chartfetch").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_unknown_preset_rejected() {
    let mut cmd = Command::cargo_bin("chartfetch").unwrap();
    cmd.args(["--preset", "gen"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gen"));
}

#[test]
fn test_binary_missing_config_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("chartfetch").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[tokio::test]
async fn test_binary_unreachable_index_exits_one() {
    let Some(server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };
    serve_status(&server, INDEX_ROUTE, 404).await;
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("output");

    let mut cmd = Command::cargo_bin("chartfetch").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .args(["-q", "-r", "0", "--index-page", "index.html"])
        .arg("--base-url")
        .arg(format!("{}/chapter", server.uri()))
        .arg("-o")
        .arg(&root)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("index"));
    assert!(!root.exists());
}

#[tokio::test]
async fn test_binary_writes_documents_and_summary() {
    let Some(server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };
    serve_html(&server, INDEX_ROUTE, page(&[folder_link("s1.html", "Section")])).await;
    serve_html(&server, "/chapter/s1.html", page(&[folder_link("l1.html", "Alpha EDAA")])).await;
    serve_html(
        &server,
        "/chapter/l1.html",
        page(&[document_item("d1", "Alpha Chart"), document_item("d2", "Alpha Missing")]),
    )
    .await;
    serve_chart(&server, "d1", 2, 2).await;
    serve_status(&server, "/print/AD/d2.html", 404).await;

    let dir = TempDir::new().unwrap();
    let config = dir.path().join("chartfetch.conf");
    std::fs::write(&config, "skip_sections = 0\n").unwrap();
    let root = dir.path().join("output");

    let mut cmd = Command::cargo_bin("chartfetch").unwrap();
    cmd.args(["-q", "-p", "ad", "-r", "0", "--index-page", "index.html"])
        .arg("--config")
        .arg(&config)
        .arg("--base-url")
        .arg(format!("{}/chapter", server.uri()))
        .arg("--print-url")
        .arg(format!("{}/print/AD", server.uri()))
        .arg("-o")
        .arg(&root)
        .assert()
        .code(2);

    assert!(root.join("byop").join("Alpha_VFR-AIP_Chart.pdf").exists());
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["documents_written"], 1);
    assert_eq!(summary["errors"][0]["kind"], "unreachable");
}
