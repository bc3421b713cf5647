use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn cargo_bin(temp: &assert_fs::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("apibench").expect("binary exists");
    cmd.current_dir(temp.path()).env("NO_COLOR", "1");
    cmd
}

#[test]
fn displays_help() {
    let temp = assert_fs::TempDir::new().unwrap();
    cargo_bin(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("API-testing workbench"));
}

#[test]
fn displays_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    cargo_bin(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn send_executes_and_records_history() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/ping");
        then.status(200)
            .header("content-type", "application/json")
            .body("{\"ok\":true}");
    });

    cargo_bin(&temp)
        .args(["send", "GET", &server.url("/ping")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:"))
        .stdout(predicate::str::contains("200"))
        .stdout(predicate::str::contains("\"ok\": true"));

    mock.assert();
    temp.child("apibench-data.json").assert(predicate::path::exists());

    cargo_bin(&temp)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/ping"));
}

#[test]
fn send_reports_invalid_url_and_fails() {
    let temp = assert_fs::TempDir::new().unwrap();

    cargo_bin(&temp)
        .args(["send", "GET", "{{host}}/ping", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"))
        .stdout(predicate::str::contains("Invalid URL: {{host}}/ping"));

    cargo_bin(&temp)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn stored_request_runs_with_environment() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/widgets")
            .header("authorization", "Bearer secret")
            .json_body(serde_json::json!({"name": "gear"}));
        then.status(201).body("created");
    });

    temp.child("dev.env")
        .write_str("TOKEN=secret\n")
        .unwrap();

    cargo_bin(&temp)
        .args(["env", "add", "dev", "--from-file", "dev.env", "--var"])
        .arg(format!("base={}", server.base_url()))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 variables"));

    cargo_bin(&temp)
        .args([
            "request",
            "add",
            "--name",
            "Create widget",
            "POST",
            "{{base}}/widgets",
            "-H",
            "Authorization: Bearer {{TOKEN}}",
            "-d",
            "{\"name\": \"gear\"}",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored request #1"));

    cargo_bin(&temp)
        .args(["run", "1", "--env", "dev", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": 201"))
        .stdout(predicate::str::contains("\"data\": \"created\""));

    mock.assert();
}

#[test]
fn config_selects_store_and_default_environment() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(204);
    });

    temp.child("apibench.json")
        .write_str(r#"{"store": "data/bench.json", "defaultEnvironment": "local"}"#)
        .unwrap();

    cargo_bin(&temp)
        .args(["env", "add", "local", "--var"])
        .arg(format!("base={}", server.base_url()))
        .assert()
        .success();

    cargo_bin(&temp)
        .args(["send", "get", "{{base}}/health"])
        .assert()
        .success()
        .stdout(predicate::str::contains("204"));

    mock.assert();
    temp.child("data/bench.json").assert(predicate::path::exists());
    temp.child("apibench-data.json")
        .assert(predicate::path::missing());
}
