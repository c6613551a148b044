//! Integration tests for the `mowctl` binary.
//!
//! Argument parsing, help output, completions and error exits run without a
//! cloud. The end-to-end cases point `--api-url` at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `mowctl` binary with env isolation.
///
/// Clears all `MOWCTL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn mowctl_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("mowctl");
    cmd.env("HOME", "/tmp/mowctl-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/mowctl-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/mowctl-cli-test-nonexistent")
        .env_remove("MOWCTL_PROFILE")
        .env_remove("MOWCTL_LOGIN")
        .env_remove("MOWCTL_PASSWORD")
        .env_remove("MOWCTL_MOWER")
        .env_remove("MOWCTL_API_URL")
        .env_remove("MOWCTL_OUTPUT")
        .env_remove("MOWCTL_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn token_body() -> serde_json::Value {
    json!({
        "data": {
            "id": "tok-123",
            "type": "token",
            "attributes": { "provider": "husqvarna", "expires_in": 3600 }
        }
    })
}

/// A cloud with one login, two mowers and a charging status for the first.
async fn mock_cloud() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/mowers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "m-1", "name": "Front lawn", "model": "G" },
            { "id": "m-2", "name": "Back lawn", "model": "H" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/mowers/m-1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mowerStatus": "OK_CHARGING",
            "batteryPercent": 88,
            "storedTimestamp": 1_560_000_000_000_i64,
            "lastErrorCode": 0,
            "lastErrorCodeTimestamp": 0,
            "lastLocations": []
        })))
        .mount(&server)
        .await;
    server
}

/// Run `args` against `server` with inline credentials and no token cache.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let mut cmd = mowctl_cmd();
    cmd.args([
        "--api-url",
        &server.uri(),
        "--login",
        "me@example.com",
        "--password",
        "hunter2",
        "--no-token",
    ])
    .args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_usage() {
    let output = mowctl_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn help_lists_commands() {
    mowctl_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("lawn mower")
            .and(predicate::str::contains("control"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("server")),
    );
}

#[test]
fn version_flag() {
    mowctl_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mowctl"));
}

#[test]
fn completions_bash() {
    mowctl_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn completions_zsh() {
    mowctl_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn unknown_control_action_is_rejected() {
    let output = mowctl_cmd().args(["control", "dance"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("dance"), "Expected the bad value echoed:\n{text}");
}

#[test]
fn control_action_is_case_insensitive() {
    // Parses, then fails on missing credentials rather than on the action.
    let output = mowctl_cmd().args(["control", "PARK"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn status_without_credentials_is_an_auth_error() {
    let output = mowctl_cmd().arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(
        text.contains("No credentials"),
        "Expected credentials hint:\n{text}"
    );
}

#[test]
fn unknown_profile_is_not_found() {
    let output = mowctl_cmd()
        .args(["--profile", "cabin", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("cabin"));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let output = mowctl_cmd()
        .args(["--poll-interval", "0", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("poll-interval"));
}

#[test]
fn invalid_output_format() {
    let output = mowctl_cmd()
        .args(["--output", "xml", "status"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("xml"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_path_prints_config_and_token_locations() {
    mowctl_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("config.toml")
                .and(predicate::str::contains("tokens"))
                .and(predicate::str::contains("default.toml")),
        );
}

#[test]
fn config_show_without_file_prints_defaults() {
    mowctl_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("poll_interval = 10"));
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn list_prints_mower_ids() {
    let server = mock_cloud().await;

    let output = run_against(&server, &["--output", "plain", "list"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "m-1\nm-2");
}

#[tokio::test(flavor = "multi_thread")]
async fn list_ignores_a_stale_mower_name() {
    let server = mock_cloud().await;

    let output = run_against(&server, &["--mower", "Orchard", "--output", "plain", "list"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "m-1\nm-2");
}

#[tokio::test(flavor = "multi_thread")]
async fn status_reports_normalized_state() {
    let server = mock_cloud().await;

    let output = run_against(&server, &["--output", "json", "status", "--timeout", "10"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "charging");
    assert_eq!(report["snapshot"]["battery_percent"], 88);
}

#[tokio::test(flavor = "multi_thread")]
async fn status_gives_up_when_named_mower_is_missing() {
    let server = mock_cloud().await;

    let output = run_against(&server, &["--mower", "Orchard", "status", "--timeout", "1"]).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("No mower status received"));
}
