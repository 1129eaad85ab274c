//! Integration tests for the jarvis binary
//!
//! These run the built binary against config files in a temp dir. None of
//! them reach an API server.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use jarvis::config::{Config, EnvironmentConfig};

fn jarvis() -> Command {
    Command::cargo_bin("jarvis").expect("binary should build")
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.yml");
    let mut config = Config::default();
    config.environments.insert(
        "default".to_string(),
        EnvironmentConfig {
            host: "localhost".to_string(),
            port: 3000,
            author: "Jane Doe".to_string(),
            data_directory: dir.path().join("data"),
            snapshots_directory: dir.path().join("snapshots"),
        },
    );
    config.save(&path).expect("Failed to write config");
    path
}

// =============================================================================
// Help and version
// =============================================================================

#[test]
fn test_help_lists_subcommands() {
    jarvis()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("new"))
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("admin"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_version() {
    jarvis()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_category_rejected() {
    jarvis()
        .args(["list", "events", "--category", "eaten"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("eaten"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_missing_config_points_at_init() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join("absent.yml");

    jarvis()
        .arg("-c")
        .arg(&path)
        .arg("summary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration not set up"))
        .stderr(predicate::str::contains("jarvis init"));
}

#[test]
fn test_unknown_environment_fails() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&temp);

    jarvis()
        .arg("-c")
        .arg(&path)
        .args(["-e", "production", "summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Environment 'production' not found"));
}

#[test]
fn test_restore_missing_snapshot_fails() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&temp);

    jarvis()
        .arg("-c")
        .arg(&path)
        .args(["admin", "restore"])
        .arg(temp.path().join("missing.tar.gz"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Snapshot does not exist"));
}
