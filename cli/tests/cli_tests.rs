use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command with the settings file pointed into `dir` and no inherited
/// AUTOREG_* environment
fn autoreg(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("autoreg").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("AUTOREG_BASE_URL")
        .env_remove("AUTOREG_URL")
        .env("AUTOREG_SETTINGS", dir.path().join("settings.yaml"));
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("autoreg").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto Register CLI"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("settings"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("autoreg").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("autoreg"));
}

#[test]
fn test_settings_set_and_get() {
    let dir = TempDir::new().unwrap();

    autoreg(&dir)
        .args(["settings", "set", "ar_otp_key", "abc123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ar_otp_key = abc123"));

    autoreg(&dir)
        .args(["settings", "get", "ar_otp_key"])
        .assert()
        .success()
        .stdout("abc123\n");

    let yaml = fs::read_to_string(dir.path().join("settings.yaml")).unwrap();
    assert!(yaml.contains("ar_otp_key: abc123"));
}

#[test]
fn test_settings_set_sanitizes() {
    let dir = TempDir::new().unwrap();

    autoreg(&dir)
        .args(["settings", "set", "ar_user_role", "  <b>editor</b>\n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ar_user_role = editor"))
        .stderr(predicate::str::contains("sanitized"));
}

#[test]
fn test_settings_unknown_key() {
    let dir = TempDir::new().unwrap();

    autoreg(&dir)
        .args(["settings", "set", "siteurl", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("siteurl"));

    autoreg(&dir)
        .args(["settings", "get", "siteurl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"));
}

#[test]
fn test_settings_list_formats() {
    let dir = TempDir::new().unwrap();
    autoreg(&dir)
        .args(["settings", "set", "ar_redirect_enabled", "1"])
        .assert()
        .success();

    autoreg(&dir)
        .args(["settings", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto Register Settings"))
        .stdout(predicate::str::contains("ar_redirect_enabled"))
        .stdout(predicate::str::contains("(unset)"));

    autoreg(&dir)
        .args(["settings", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ar_redirect_enabled\": \"1\""));

    autoreg(&dir)
        .args(["settings", "list", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ar_redirect_enabled: '1'"));
}

#[test]
fn test_link_requires_key() {
    let dir = TempDir::new().unwrap();

    autoreg(&dir)
        .arg("link")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No magic key configured"));
}

#[test]
fn test_link_prints_magic_url() {
    let dir = TempDir::new().unwrap();
    autoreg(&dir)
        .args(["settings", "set", "ar_otp_key", "abc123"])
        .assert()
        .success();

    autoreg(&dir)
        .args(["link", "--base-url", "https://example.com/event"])
        .assert()
        .success()
        .stdout("https://example.com/event?arotp=abc123\n");
}

#[test]
fn test_health_offline_server() {
    let dir = TempDir::new().unwrap();

    autoreg(&dir)
        .args(["health", "--url", "http://127.0.0.1:9", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"offline\""));
}
