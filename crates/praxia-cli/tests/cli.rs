//! CLI tests against a mock backend.
//!
//! Each test gets its own HOME so the stored credential is isolated, and
//! points the binary at a wiremock server through `PRAXIA_API_URL`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn run_cli(args: &[String], home: &Path, api_url: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_praxia"))
        .args(args)
        .env("HOME", home)
        .env("XDG_DATA_HOME", home.join("data"))
        .env("PRAXIA_API_URL", api_url)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI")
}

/// Run the binary off the runtime so the mock server keeps serving.
async fn praxia(args: &[&str], home: &Path, server: &MockServer) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let home = home.to_path_buf();
    let api_url = format!("{}/api", server.uri());

    tokio::task::spawn_blocking(move || run_cli(&args, &home, &api_url))
        .await
        .expect("CLI task panicked")
}

fn credential_file(home: &Path) -> PathBuf {
    home.join("data").join("praxia").join("credential.json")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "session_key": "session-1",
            "user_id": 7,
            "email": "alice@example.com"
        })))
        .mount(server)
        .await;
}

async fn login(home: &Path, server: &MockServer) {
    let output = praxia(
        &["auth", "login", "--email", "alice@example.com", "--password", "hunter2"],
        home,
        server,
    )
    .await;
    assert!(output.status.success(), "login failed: {}", stderr(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_persists_credential() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .and(header("authorization", "Bearer access-1"))
        .and(header("x-session-key", "session-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "alice",
            "email": "alice@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    login(home.path(), &server).await;

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(credential_file(home.path())).unwrap())
            .unwrap();
    assert_eq!(stored["access_token"], "access-1");
    assert_eq!(stored["refresh_token"], "refresh-1");
    assert_eq!(stored["session_key"], "session-1");

    let output = praxia(&["auth", "whoami"], home.path(), &server).await;
    assert!(output.status.success(), "whoami failed: {}", stderr(&output));
    assert!(stdout(&output).contains("alice"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_removes_credential() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    login(home.path(), &server).await;
    assert!(credential_file(home.path()).exists());

    let output = praxia(&["auth", "logout"], home.path(), &server).await;
    assert!(output.status.success());
    assert!(!credential_file(home.path()).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_session_suggests_login() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})))
        .expect(1)
        .mount(&server)
        .await;

    login(home.path(), &server).await;

    let output = praxia(&["auth", "whoami"], home.path(), &server).await;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Your session has expired"));
    assert!(stderr(&output).contains("praxia auth login"));
    assert!(!credential_file(home.path()).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_commands_require_login() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    let output = praxia(&["chat", "list"], home.path(), &server).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not logged in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_is_public() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/health/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "database": "connected",
            "ai_system": "ready",
            "version": "1.2.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = praxia(&["health"], home.path(), &server).await;

    assert!(output.status.success(), "health failed: {}", stderr(&output));
    assert!(stdout(&output).contains("healthy"));
    assert!(stdout(&output).contains("1.2.0"));
}
