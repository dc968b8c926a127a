//! CLI integration tests
use predicates::prelude::*;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("favea")
}

#[test]
fn test_cli_requires_input() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("keyword"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("favea"));
}

#[test]
fn test_cli_rejects_unknown_flag() {
    cmd()
        .args(["--frobnicate", "星野アイ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}
