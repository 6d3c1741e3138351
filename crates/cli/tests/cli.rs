//! Binary smoke tests for the flextk CLI

use assert_cmd::Command;
use predicates::prelude::*;

fn flextk() -> Command {
    Command::cargo_bin("flextk").unwrap()
}

#[test]
fn test_help_lists_command_groups() {
    flextk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloud"))
        .stdout(predicate::str::contains("drive"))
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("pay"))
        .stdout(predicate::str::contains("media"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_version() {
    flextk()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("flextk"));
}

#[test]
fn test_unknown_subcommand_fails() {
    flextk().arg("teleport").assert().failure();
}

#[test]
fn test_completion_bash() {
    flextk()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flextk"));
}

#[test]
fn test_completion_unknown_shell() {
    flextk()
        .args(["completion", "tcsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown shell"));
}

#[test]
fn test_doctor_check_reports_config_state() {
    let home = tempfile::tempdir().unwrap();
    flextk()
        .env("HOME", home.path())
        .args(["doctor", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Media tools"));
}

#[test]
fn test_cloud_gcs_requires_password_setup() {
    let home = tempfile::tempdir().unwrap();
    flextk()
        .env("HOME", home.path())
        .args(["cloud", "gcs", "ls", "--password", "hunter2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("set-password"));
}

#[test]
fn test_media_help_lists_kinds() {
    flextk()
        .args(["media", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("video"))
        .stdout(predicate::str::contains("audio"))
        .stdout(predicate::str::contains("image"))
        .stdout(predicate::str::contains("doc"));
}
