//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn storyshare() -> Command {
    let mut cmd = Command::cargo_bin("storyshare").unwrap();
    // Keep the developer's .env and shell from leaking into the tests
    cmd.env_remove("DEBUG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_top_level_help_lists_commands() {
    storyshare()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check-db"))
        .stdout(predicate::str::contains("hash-password"));
}

#[test]
fn test_serve_help() {
    storyshare()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--cors-permissive"))
        .stdout(predicate::str::contains("--static-dir"));
}

#[test]
fn test_check_db_help() {
    storyshare()
        .arg("check-db")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Print the result as JSON"));
}

#[test]
fn test_check_db_unreachable_fails() {
    storyshare()
        .arg("check-db")
        .arg("--json")
        .env("DB_HOST", "127.0.0.1")
        .env("DB_PORT", "1")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"unreachable\""));
}

#[test]
fn test_check_db_rejects_bad_port() {
    storyshare()
        .arg("check-db")
        .env("DB_PORT", "not-a-port")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_hash_password_argument() {
    storyshare()
        .arg("hash-password")
        .arg("s3cret")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("$argon2id$"));
}

#[test]
fn test_hash_password_stdin() {
    storyshare()
        .arg("hash-password")
        .write_stdin("s3cret\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("$argon2id$"));
}

#[test]
fn test_hash_password_rejects_empty() {
    storyshare()
        .arg("hash-password")
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn test_debug_env_accepts_common_spellings() {
    for value in ["True", "1", "yes", "on", "False", "0", "off"] {
        storyshare()
            .env("DEBUG", value)
            .arg("hash-password")
            .arg("s3cret")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("$argon2id$"));
    }
}

#[test]
fn test_debug_env_reaches_check_db() {
    storyshare()
        .env("DEBUG", "True")
        .env("DB_HOST", "127.0.0.1")
        .env("DB_PORT", "1")
        .arg("check-db")
        .assert()
        .failure()
        .stdout(predicate::str::contains("unreachable"));
}

#[test]
fn test_unknown_subcommand_fails() {
    storyshare().arg("publish").assert().failure();
}
