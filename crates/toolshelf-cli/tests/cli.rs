//! CLI integration tests against a mock backend.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the CLI binary against `api_url` with an isolated store file.
async fn run_cli(args: &[&str], store: &Path, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_toolshelf"));
    cmd.args(args);
    cmd.env("TOOLSHELF_API_URL", api_url);
    cmd.env("TOOLSHELF_STORE", store);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");

    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
        .await
        .unwrap()
}

async fn run_cli_success(args: &[&str], store: &Path, api_url: &str) -> String {
    let output = run_cli(args, store, api_url).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn store_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("store.json")
}

fn stored_entries(store: &Path) -> Value {
    let raw: Value = serde_json::from_str(&std::fs::read_to_string(store).unwrap()).unwrap();
    raw["entries"].clone()
}

async fn mount_backend(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"_id": "u1", "username": "ada", "email": "ada@example.com"},
            "accessToken": "a1",
            "refreshToken": "r1",
            "message": "Logged in"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/auth/check-session"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"_id": "u1", "username": "ada", "email": "ada@example.com"}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/user/tools"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": ["t1"]})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/user/bookmarks"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"tools": [{"_id": "b1"}]})),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(body_json(json!({"refreshToken": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Logged out"})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_whoami_collections_logout() {
    let server = MockServer::start().await;
    mount_backend(&server).await;
    let api_url = server.uri();
    let temp_dir = TempDir::new().unwrap();
    let store = store_path(&temp_dir);

    let stdout = run_cli_success(
        &["login", "--email", "ada@example.com", "--password", "secret123"],
        &store,
        &api_url,
    )
    .await;
    assert!(stdout.contains("Logged in successfully"));
    assert!(stdout.contains("ada"));
    assert_eq!(stored_entries(&store)["accessToken"], "a1");
    assert_eq!(stored_entries(&store)["refreshToken"], "r1");

    let stdout = run_cli_success(&["whoami"], &store, &api_url).await;
    assert!(stdout.contains("u1"));
    assert!(stdout.contains("ada@example.com"));

    let stdout = run_cli_success(&["collections", "--json"], &store, &api_url).await;
    let collections: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(collections, json!({"tools": ["t1"], "bookmarkedTools": ["b1"]}));

    let stdout = run_cli_success(&["logout"], &store, &api_url).await;
    assert!(stdout.contains("Logged out"));
    let entries = stored_entries(&store);
    assert!(entries.get("accessToken").is_none());
    assert!(entries.get("refreshToken").is_none());
    assert!(entries.get("userState").is_none());

    let output = run_cli(&["whoami"], &store, &api_url).await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not logged in"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_whoami_without_session_does_not_call_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let output = run_cli(&["whoami", "--json"], &store_path(&temp_dir), &server.uri()).await;
    assert!(output.status.success());

    let session: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(session["state"], "unauthenticated");
    assert_eq!(session["user"], Value::Null);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_with_wrong_password_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid email or password"
        })))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let store = store_path(&temp_dir);

    let output = run_cli(
        &["login", "--email", "ada@example.com", "--password", "nope"],
        &store,
        &server.uri(),
    )
    .await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid email or password"));
    assert!(!store.exists());
}
