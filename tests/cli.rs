//! End-to-end checks of the mapfold binary.

mod common;

use assert_cmd::Command;
use common::write_fixture_files;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn run_counts_lines_across_a_directory() {
    let dir = TempDir::new().unwrap();
    write_fixture_files(dir.path(), &[3, 5, 0]);

    Command::cargo_bin("mapfold")
        .unwrap()
        .arg("run")
        .arg("--data-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("There are 8 lines"));
}

#[test]
fn run_fails_cleanly_on_missing_directory() {
    Command::cargo_bin("mapfold")
        .unwrap()
        .arg("run")
        .arg("--data-dir")
        .arg("/nonexistent/inputs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn run_without_locator_reports_missing_key() {
    Command::cargo_bin("mapfold")
        .unwrap()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("data_dir"));
}

#[test]
fn demo_generates_and_counts_fixtures() {
    Command::cargo_bin("mapfold")
        .unwrap()
        .arg("demo")
        .arg("--files")
        .arg("5")
        .assert()
        .success()
        .stdout(predicate::str::contains("lines"));
}

#[test]
fn run_with_job_file() {
    let dir = TempDir::new().unwrap();
    write_fixture_files(dir.path(), &[2, 2]);

    let config_dir = TempDir::new().unwrap();
    let job_path = config_dir.path().join("job.yml");
    std::fs::write(
        &job_path,
        format!("data_dir: {}\nmax_parallel: 2\n", dir.path().display()),
    )
    .unwrap();

    Command::cargo_bin("mapfold")
        .unwrap()
        .arg("run")
        .arg("--config")
        .arg(&job_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("There are 4 lines"));
}
