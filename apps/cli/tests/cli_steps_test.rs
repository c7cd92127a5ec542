//! Integration tests for the `runlog write` / `runlog read` steps.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn runlog(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("runlog").unwrap();
    cmd.current_dir(temp_dir.path())
        .env("HOME", temp_dir.path())
        .env_remove("REPO_ROOT")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_write_then_read() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("shared");

    runlog(&temp_dir)
        .arg("write")
        .arg("--content")
        .arg("Houston we do not have a problem!")
        .arg("--data-path")
        .arg(&data_path)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(data_path.join("file.txt")).unwrap(),
        "Houston we do not have a problem!"
    );

    runlog(&temp_dir)
        .arg("read")
        .arg("--data-path")
        .arg(&data_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Houston we do not have a problem!"));
}

#[test]
fn test_write_defaults_to_repo_root() {
    let temp_dir = TempDir::new().unwrap();

    runlog(&temp_dir)
        .env("REPO_ROOT", temp_dir.path())
        .args(["write", "--content", "from the repo root"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Using debug args"));

    let file = temp_dir.path().join("data").join("outputs").join("file.txt");
    assert_eq!(fs::read_to_string(file).unwrap(), "from the repo root");
}

#[test]
fn test_read_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    runlog(&temp_dir)
        .arg("read")
        .arg("--data-path")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("input file not found"));
}

#[test]
fn test_read_without_data_path_or_repo_root_fails() {
    let temp_dir = TempDir::new().unwrap();

    runlog(&temp_dir)
        .arg("read")
        .assert()
        .failure()
        .stderr(predicate::str::contains("REPO_ROOT is not set"));
}
