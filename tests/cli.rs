// ABOUTME: Integration tests for the relevo CLI commands.
// ABOUTME: Validates --help output, init behavior, and manifest error exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn relevo_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("relevo"))
}

#[test]
fn help_shows_commands() {
    relevo_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("logs"));
}

#[test]
fn init_creates_manifest_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest_path = temp_dir.path().join("relevo.yml");

    relevo_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(manifest_path.exists(), "relevo.yml should be created");
    let content = fs::read_to_string(&manifest_path).unwrap();
    assert!(content.contains("image:"), "manifest should have image field");
    assert!(content.contains("health:"), "manifest should have health block");
}

#[test]
fn init_refuses_to_overwrite_existing_manifest() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest_path = temp_dir.path().join("relevo.yml");

    fs::write(&manifest_path, "existing: manifest").unwrap();

    relevo_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .code(1);

    let content = fs::read_to_string(&manifest_path).unwrap();
    assert_eq!(content, "existing: manifest");
}

#[test]
fn init_force_overwrites_with_overrides() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest_path = temp_dir.path().join("relevo.yml");

    fs::write(&manifest_path, "existing: manifest").unwrap();

    relevo_cmd()
        .current_dir(temp_dir.path())
        .args([
            "init",
            "--force",
            "--service",
            "api",
            "--image",
            "ghcr.io/acme/api:1.0",
        ])
        .assert()
        .success();

    let content = fs::read_to_string(&manifest_path).unwrap();
    assert!(content.contains("service: api"));
    assert!(content.contains("ghcr.io/acme/api:1.0"));
}

#[test]
fn deploy_with_missing_manifest_exits_one() {
    let temp_dir = tempfile::tempdir().unwrap();

    relevo_cmd()
        .env("RELEVO_STATE_DIR", temp_dir.path())
        .arg("deploy")
        .arg(temp_dir.path().join("missing.yml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("manifest"));
}

#[test]
fn deploy_with_invalid_manifest_exits_one() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest_path = temp_dir.path().join("relevo.yml");
    fs::write(&manifest_path, "service: [not a name\n").unwrap();

    relevo_cmd()
        .env("RELEVO_STATE_DIR", temp_dir.path())
        .arg("deploy")
        .arg(&manifest_path)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn deploy_exits_three_while_another_rollout_holds_the_lock() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest_path = temp_dir.path().join("relevo.yml");
    fs::write(
        &manifest_path,
        "service: web\nimage: nginx\nports:\n  - \"8080:80\"\nhealth:\n  path: /\n  port: 8080\n",
    )
    .unwrap();

    // A fresh lock left by a concurrent rollout of the same service.
    let lock = serde_json::json!({
        "holder": "other-host",
        "pid": 4242,
        "started_at": chrono::Utc::now(),
        "service": "web",
    });
    fs::write(temp_dir.path().join("web.lock"), lock.to_string()).unwrap();

    relevo_cmd()
        .env("RELEVO_STATE_DIR", temp_dir.path())
        .arg("deploy")
        .arg(&manifest_path)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("rollout is in progress"));
}

#[test]
fn status_without_history_reports_none() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest_path = temp_dir.path().join("relevo.yml");
    fs::write(
        &manifest_path,
        "service: web\nimage: nginx\nhealth:\n  path: /\n  port: 8080\n",
    )
    .unwrap();

    relevo_cmd()
        .env("RELEVO_STATE_DIR", temp_dir.path())
        // No runtime socket in the test environment.
        .env_remove("DOCKER_HOST")
        .arg("status")
        .arg(&manifest_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Service: web"))
        .stdout(predicate::str::contains("Last rollout: none"));
}
