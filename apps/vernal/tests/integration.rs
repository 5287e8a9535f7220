//! Integration tests for vernal CLI

use std::path::Path;
use std::process::{Command, Output};

fn vernal(config: Option<&Path>, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_vernal"));
    for var in [
        "VERNAL_SERVER",
        "VERNAL_BASE_URL",
        "VERNAL_INSTALL_DIR",
        "VERNAL_USER_ID",
        "RUST_LOG",
    ] {
        command.env_remove(var);
    }
    if let Some(config) = config {
        command.arg("--config").arg(config);
    }
    command.args(args).output().expect("Failed to execute vernal")
}

/// Config file pointing every path into `dir`
fn sandbox_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let contents = format!(
        "[install]\ninstallation_dir = {:?}\npreferences_path = {:?}\n\n[service]\nuser_id = 501\n",
        dir.join("install").display().to_string(),
        dir.join("preferences.json").display().to_string(),
    );
    std::fs::write(&path, contents).unwrap();
    path
}

fn json_stdout(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_cli_version() {
    let output = vernal(None, &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vernal"));
}

#[test]
fn test_cli_help() {
    let output = vernal(None, &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Installer and service supervisor for Vernal Falls"));
    assert!(stdout.contains("install"));
    assert!(stdout.contains("check-connection"));
    assert!(stdout.contains("servers"));
}

#[test]
fn test_cli_invalid_command() {
    let output = vernal(None, &["invalid-command"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_install_requires_credentials() {
    let output = Command::new(env!("CARGO_BIN_EXE_vernal"))
        .env_remove("VERNAL_PASSWORD")
        .args(["install", "--username", "me"])
        .output()
        .expect("Failed to execute vernal");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--password"));
}

#[test]
fn test_unknown_server_is_rejected() {
    let output = vernal(None, &["check-connection", "--server", "moon"]);
    assert!(!output.status.success());
}

#[test]
fn test_servers_json_lists_catalogue() {
    let temp = tempfile::tempdir().unwrap();
    let config = sandbox_config(temp.path());

    let value = json_stdout(&vernal(Some(&config), &["--json", "servers"]));
    assert_eq!(value["result"], "servers");

    let servers = value["data"].as_array().unwrap();
    let names: Vec<_> = servers.iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["localhost", "offline", "staging", "production"]);

    let selected: Vec<_> = servers
        .iter()
        .filter(|s| s["selected"] == true)
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(selected, ["production"]);
}

#[test]
fn test_pinned_url_replaces_selected_server() {
    let temp = tempfile::tempdir().unwrap();
    let config = sandbox_config(temp.path());

    json_stdout(&vernal(
        Some(&config),
        &["--json", "server-url", "https://pinned.example.com/"],
    ));
    let value = json_stdout(&vernal(Some(&config), &["--json", "servers"]));
    let production = &value["data"][3];
    assert_eq!(production["base_url"], "https://pinned.example.com/");
    assert_eq!(value["data"][2]["base_url"], "https://staging.spartascience.com/");

    json_stdout(&vernal(Some(&config), &["--json", "server-url"]));
    let value = json_stdout(&vernal(Some(&config), &["--json", "servers"]));
    assert_eq!(value["data"][3]["base_url"], "https://home.spartascience.com/");
}

#[test]
fn test_status_of_fresh_sandbox() {
    let temp = tempfile::tempdir().unwrap();
    let config = sandbox_config(temp.path());

    let value = json_stdout(&vernal(Some(&config), &["--json", "status"]));
    assert_eq!(value["result"], "status");
    assert_eq!(value["data"]["state"]["state"], "logged_out");
    assert_eq!(value["data"]["payload_present"], false);
    assert_eq!(value["data"]["server"], "production");
    assert!(value["data"]["config_file"]
        .as_str()
        .unwrap()
        .ends_with("config.yml"));
}

#[test]
fn test_check_connection_reports_unreachable() {
    let temp = tempfile::tempdir().unwrap();
    let config = sandbox_config(temp.path());
    // Nothing listens on the discard port.
    let value = json_stdout(&vernal(
        Some(&config),
        &["--json", "check-connection", "--base-url", "http://127.0.0.1:9"],
    ));
    assert_eq!(value["result"], "connection");
    assert_eq!(value["data"]["reachable"], false);
    assert_eq!(value["data"]["url"], "http://127.0.0.1:9/api/health-check");
}
