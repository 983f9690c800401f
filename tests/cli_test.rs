//! Command-line surface of the `vibe-eyes` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vibe_eyes() -> Command {
    Command::cargo_bin("vibe-eyes").expect("Binary not built")
}

#[test]
fn test_help_lists_flags() {
    vibe_eyes()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--passion"))
        .stdout(predicate::str::contains("--drama"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--no-estimator"));
}

#[test]
fn test_version() {
    vibe_eyes()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_print_config_applies_overrides() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("absent.toml");

    vibe_eyes()
        .arg("--config")
        .arg(&missing)
        .args(["--passion", "1.5", "--drama", "0.3", "--no-estimator", "--print-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[blender]"))
        .stdout(predicate::str::contains("passion = 1.5"))
        .stdout(predicate::str::contains("drama = 0.3"))
        .stdout(predicate::str::contains("enabled = false"));
}

#[test]
fn test_print_config_reads_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("vibe.toml");
    std::fs::write(&path, "[coordinator]\ntick_hz = 25.0\n").expect("Failed to write config");

    vibe_eyes()
        .arg("--config")
        .arg(&path)
        .arg("--print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("tick_hz = 25.0"));
}

#[test]
fn test_out_of_range_drama_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("absent.toml");

    vibe_eyes()
        .arg("--config")
        .arg(&missing)
        .args(["--drama", "1.5", "--print-config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("amplifier.drama"));
}

#[test]
fn test_malformed_config_file_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[blender\n").expect("Failed to write config");

    vibe_eyes()
        .arg("--config")
        .arg(&path)
        .arg("--print-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid TOML config"));
}
