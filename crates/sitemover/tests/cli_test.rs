//! Integration tests for the `sitemover` CLI binary.
//!
//! Argument parsing, help output, shell completions and error exit codes run
//! without a service; the end-to-end migration runs against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `sitemover` binary with env isolation.
///
/// Clears all `SITEMOVER_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn sitemover_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sitemover");
    cmd.env("HOME", "/tmp/sitemover-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/sitemover-cli-test-nonexistent")
        .env_remove("SITEMOVER_PROFILE")
        .env_remove("SITEMOVER_API_URL")
        .env_remove("SITEMOVER_TOKEN")
        .env_remove("SITEMOVER_OUTPUT")
        .env_remove("SITEMOVER_INSECURE")
        .env_remove("SITEMOVER_TIMEOUT")
        .env_remove("SITEMOVER_RETRIES")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// One domain ("HQ") directly under Global with one floor and one AP.
fn write_snapshot(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("snapshot.json");
    let snapshot = json!({
        "domains": [
            {
                "name": "HQ",
                "location_tree": [],
                "address": "1 Main St",
                "country_code": 840,
                "floors": ["F1"]
            },
            { "name": "Empty", "location_tree": [], "floors": ["F1"] }
        ],
        "aps": [
            { "name": "ap-1", "mac": "aa:bb:cc:dd:ee:01", "domain": "HQ", "floor": "F1" }
        ]
    });
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = sitemover_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    sitemover_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("migrate")
            .and(predicate::str::contains("preview"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    sitemover_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitemover"));
}

#[test]
fn test_migrate_help_lists_strategies() {
    sitemover_cmd()
        .args(["migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--match-by").and(predicate::str::contains("group")));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    sitemover_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    sitemover_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_match_strategy() {
    let output = sitemover_cmd()
        .args(["migrate", "snapshot.json", "--match-by", "serial"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("serial"), "Expected the bad value echoed:\n{text}");
}

#[test]
fn test_migrate_missing_snapshot() {
    let output = sitemover_cmd()
        .args(["migrate", "/tmp/sitemover-cli-test-nonexistent/snap.json", "--yes"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "Expected exit code 4");
    let text = combined_output(&output);
    assert!(text.contains("Snapshot file not found"), "{text}");
}

#[test]
fn test_migrate_malformed_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let output = sitemover_cmd()
        .args(["migrate", "--yes", "--token", "t"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Invalid snapshot"));
}

#[test]
fn test_migrate_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());

    let output = sitemover_cmd()
        .args(["migrate", "--yes"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected exit code 3");
    let text = combined_output(&output);
    assert!(text.contains("No API token configured"), "{text}");
}

#[test]
fn test_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());

    let output = sitemover_cmd()
        .args(["migrate", "--yes", "--profile", "nope"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Profile 'nope' not found"));
}

// ── Preview ─────────────────────────────────────────────────────────

#[test]
fn test_preview_json_needs_no_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());

    let output = sitemover_cmd()
        .args(["preview", "-o", "json"])
        .arg(&snapshot)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let preview: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        preview["Global"]["BUILDINGS"]["HQ"]["FLOORS"]["F1"]["deviceCount"],
        json!(1)
    );
    assert!(preview["Global"]["BUILDINGS"].get("Empty").is_none());
}

#[test]
fn test_preview_table_is_a_tree() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());

    sitemover_cmd()
        .args(["preview", "--color", "never"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Global")
                .and(predicate::str::contains("building HQ (1 Main St)"))
                .and(predicate::str::contains("floor F1: 1 APs")),
        );
}

// ── End-to-end migration ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_migrate_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/locations/tree"))
        .and(query_param("parentId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/locations/tree"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": 1, "name": "Global", "type": "Global" }])),
        )
        .mount(&server)
        .await;

    for kind in ["building", "floor"] {
        Mock::given(method("GET"))
            .and(path(format!("/locations/{kind}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/locations/building"))
        .and(body_partial_json(json!({ "parent_id": 1, "name": "HQ" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 10, "name": "HQ" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/locations/floor"))
        .and(body_partial_json(json!({ "parent_id": 10, "name": "F1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 20, "name": "F1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("macAddresses", "AABBCCDDEE01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1, "count": 1, "total_pages": 1, "total_count": 1,
            "data": [{ "id": 100, "hostname": "ap-1", "mac_address": "AABBCCDDEE01" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/devices/100/location"))
        .and(body_partial_json(json!({ "location_id": 20 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        sitemover_cmd()
            .args(["migrate", "--yes", "-o", "json", "--token", "test-token", "--api-url"])
            .arg(&uri)
            .arg(&snapshot)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["domains_found"], json!(2));
    assert_eq!(summary["aps_found"], json!(1));
    assert_eq!(summary["excluded_domains"], json!(["Empty"]));
    assert_eq!(summary["strategy"], json!("mac"));
    assert_eq!(summary["devices_eligible"], json!(1));
    assert_eq!(summary["devices_moved"], json!(1));

    let entries = summary["provision"]["entries"].as_array().unwrap();
    assert!(entries
        .iter()
        .any(|e| e["kind"] == json!("Building") && e["outcome"] == json!("created")));
}
