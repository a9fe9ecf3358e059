//! Shared helpers for the Web API integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use filenest::config::WebConfig;
use filenest::web::handlers::AppState;
use filenest::web::router::create_router;
use filenest::{MemoryCredentialStore, NamespaceResolver};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";

/// A test server and the directory holding its storage roots.
pub struct TestApp {
    pub server: TestServer,
    pub dir: TempDir,
}

impl TestApp {
    /// Path of a user's upload directory.
    pub fn upload_dir(&self, username: &str) -> PathBuf {
        self.dir.path().join("uploads").join(username)
    }

    /// Path of a user's backup directory.
    pub fn backup_dir(&self, username: &str) -> PathBuf {
        self.dir.path().join("backups").join(username)
    }
}

/// Create a test server with an in-memory credential store.
pub fn create_test_app() -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let resolver = NamespaceResolver::new(dir.path().join("uploads"), dir.path().join("backups"))
        .expect("Failed to create storage roots");

    let web = WebConfig {
        jwt_secret: JWT_SECRET.to_string(),
        ..WebConfig::default()
    };
    let app_state = Arc::new(AppState::new(
        Arc::new(MemoryCredentialStore::new()),
        resolver,
        &web.jwt_secret,
        web.jwt_access_token_expiry_secs,
    ));

    let router = create_router(app_state, &web, 1024 * 1024);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp { server, dir }
}

/// Sign up a user and return their access token.
pub async fn signup(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/signup")
        .json(&json!({ "username": username, "password": password }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body = response.json::<Value>();
    body["data"]["access_token"]
        .as_str()
        .expect("No access token")
        .to_string()
}

/// Upload a file as the token's user.
pub async fn upload(server: &TestServer, token: &str, name: &str, content: &[u8]) -> TestResponse {
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec()).file_name(name.to_string()),
    );

    server
        .post("/api/files")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .multipart(form)
        .await
}

/// Sorted names of the token's user's files.
pub async fn file_names(server: &TestServer, token: &str) -> Vec<String> {
    let response = server
        .get("/api/files")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    let mut names: Vec<String> = body["data"]
        .as_array()
        .expect("data is not an array")
        .iter()
        .map(|f| f["name"].as_str().unwrap_or_default().to_string())
        .collect();
    names.sort();
    names
}
