//! CLI integration tests
//!
//! Tests the deckhand CLI using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;

fn deckhand() -> Command {
    Command::cargo_bin("deckhand")
        .expect("Failed to locate deckhand binary - ensure it's built before running tests")
}

#[test]
fn test_cli_help() {
    deckhand()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deckhand"))
        .stdout(predicate::str::contains(
            "Operator console for a workspace orchestration server",
        ));
}

#[test]
fn test_cli_version() {
    deckhand()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deckhand"));
}

#[test]
fn test_cli_services_help() {
    deckhand()
        .args(["services", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("List services"));
}

#[test]
fn test_cli_start_help() {
    deckhand()
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Start a service"));
}

#[test]
fn test_cli_upload_help() {
    deckhand()
        .args(["upload", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration file"));
}

#[test]
fn test_cli_logs_help() {
    deckhand()
        .args(["logs", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tail"));
}

#[test]
fn test_cli_config_path_runs_offline() {
    // config subcommands never open a session
    deckhand()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deckhand"));
}

#[test]
fn test_cli_rejects_unknown_subcommand() {
    deckhand().arg("frobnicate").assert().failure();
}

#[test]
fn test_cli_requires_subcommand() {
    deckhand().assert().failure();
}
