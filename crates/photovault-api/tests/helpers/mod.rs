//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p photovault-api --test objects_test`
//! or `cargo test -p photovault-api`. Policies and grants live in memory; the
//! private and public roots are temp directories.

#![allow(dead_code)]

pub mod auth;

use axum_test::TestServer;
use photovault_api::setup::{routes, services};
use photovault_api::state::AppState;
use photovault_core::{Config, StorageConfig, UploadTargetMode};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_BASE_URL: &str = "http://localhost:3000";
pub const TEST_SIGNING_SECRET: &str = "test-upload-signing-secret-at-least-32-chars";
pub const TEST_CACHE_TTL_SECS: u64 = 3600;

/// Test application: server, state, and owned temp directories.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub private_dir: TempDir,
    pub public_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn private_root(&self) -> &Path {
        self.private_dir.path()
    }

    pub fn public_root(&self) -> &Path {
        self.public_dir.path()
    }

    /// Physical location uploads for `object_id` land at.
    pub fn upload_path(&self, object_id: &str) -> PathBuf {
        self.private_root().join("uploads").join(object_id)
    }
}

pub fn test_config(private_dir: &Path, public_dir: &Path, mode: UploadTargetMode) -> Config {
    Config {
        server_port: 3000,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        jwt_secret: auth::TEST_JWT_SECRET.to_string(),
        database_url: None,
        db_max_connections: 10,
        storage: StorageConfig {
            private_object_dir: Some(private_dir.to_path_buf()),
            public_object_search_paths: vec![public_dir.to_path_buf()],
            upload_target: mode,
            public_base_url: TEST_BASE_URL.to_string(),
            upload_signing_secret: Some(TEST_SIGNING_SECRET.to_string()),
            upload_grant_ttl_secs: 900,
            object_cache_ttl_secs: TEST_CACHE_TTL_SECS,
            max_upload_size_bytes: 10 * 1024 * 1024,
            enforce_upload_grants: true,
        },
    }
}

/// Setup test app with in-memory repositories and temp-dir storage.
pub async fn setup_test_app(mode: UploadTargetMode) -> TestApp {
    let private_dir = TempDir::new().expect("Failed to create private root");
    let public_dir = TempDir::new().expect("Failed to create public root");
    let config = test_config(private_dir.path(), public_dir.path(), mode);

    let state = services::initialize_services(&config)
        .await
        .expect("Failed to initialize services");
    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        private_dir,
        public_dir,
    }
}

/// Request an upload grant as `principal`; returns the response JSON.
pub async fn request_upload_grant(app: &TestApp, principal: &str) -> Value {
    let response = app
        .client()
        .post("/api/objects/upload")
        .add_header("Authorization", auth::bearer(principal))
        .await;
    assert_eq!(response.status_code(), 200);
    response.json::<Value>()
}

/// Grant, write `bytes` straight to the private root, and register.
/// Returns the object id and the logical path.
pub async fn upload_and_register(
    app: &TestApp,
    owner: &str,
    bytes: &[u8],
    visibility: &str,
) -> (String, String) {
    let grant = request_upload_grant(app, owner).await;
    let object_id = grant["object_id"].as_str().expect("object_id").to_string();

    tokio::fs::write(app.upload_path(&object_id), bytes)
        .await
        .expect("Failed to write upload");

    let response = register(app, owner, &object_id, visibility).await;
    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    let object_path = body["objectPath"].as_str().expect("objectPath").to_string();

    (object_id, object_path)
}

pub async fn register(
    app: &TestApp,
    owner: &str,
    object_id: &str,
    visibility: &str,
) -> axum_test::TestResponse {
    app.client()
        .post("/api/objects")
        .add_header("Authorization", auth::bearer(owner))
        .json(&json!({ "object_id": object_id, "visibility": visibility }))
        .await
}

/// Strip the configured base URL so the test server can route a signed URL.
pub fn signed_path(upload_url: &str) -> String {
    upload_url
        .strip_prefix(TEST_BASE_URL)
        .unwrap_or(upload_url)
        .to_string()
}
