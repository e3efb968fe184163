//! Error scenario integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn voicelog(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("voicelog").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_RUNTIME_DIR", home.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("VOICELOG_DATA_DIR")
        .arg("--data-dir")
        .arg(home.path().join("journal"));
    cmd
}

#[test]
fn record_without_api_key_fails_before_recording() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .arg("record")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing API key"));
}

#[test]
fn record_with_bad_language_is_usage_error() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .env("GEMINI_API_KEY", "test-key")
        .args(["record", "--language", "!!"])
        .assert()
        .code(2);
}

#[test]
fn record_with_bad_duration_is_usage_error() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .env("GEMINI_API_KEY", "test-key")
        .args(["record", "--max-duration", "soon"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("max-duration"));
}

#[test]
fn empty_add_is_rejected() {
    let home = TempDir::new().unwrap();
    voicelog(&home).arg("add").assert().code(2);
    voicelog(&home).args(["add", "   "]).assert().code(2);

    // Nothing was written
    voicelog(&home)
        .arg("days")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn unreadable_photo_is_usage_error() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing.jpg");
    voicelog(&home)
        .args(["add", "text", "--image", missing.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Cannot read photo"));
}

#[test]
fn invalid_day_is_rejected_by_parser() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .args(["list", "--day", "2024-13-40"])
        .assert()
        .code(2);
}

#[test]
fn invalid_month_is_rejected_by_parser() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .args(["days", "--month", "April"])
        .assert()
        .code(2);
}

#[test]
fn unknown_entry_id_is_usage_error() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .args(["show", "deadbeef"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No entry matches"));
}

#[test]
fn unknown_full_id_is_not_found() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .args(["show", "0f0f0f0f-0000-4000-8000-000000000003"])
        .assert()
        .code(1);
}

#[test]
fn restore_requires_ids_or_all() {
    let home = TempDir::new().unwrap();
    voicelog(&home).args(["trash", "restore"]).assert().code(2);
    voicelog(&home)
        .args(["trash", "purge", "--all", "abcd"])
        .assert()
        .code(2);
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .args(["config", "get", "unknown_key"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn config_set_unknown_key() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .args(["config", "set", "unknown_key", "value"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn config_set_relative_data_dir_fails() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .args(["config", "set", "data_dir", "relative/path"])
        .assert()
        .failure();
}

#[test]
fn unknown_subcommand_fails() {
    let home = TempDir::new().unwrap();
    voicelog(&home)
        .arg("toggle")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized"));
}
