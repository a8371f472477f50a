//! Test helpers: build the app over disk storage in a temp dir and in-memory
//! repositories, then wrap it in an `axum_test::TestServer`.

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use campus_api::constants::{API_PREFIX, USER_ID_HEADER};
use campus_api::setup::routes;
use campus_api::AppState;
use campus_core::{BaseConfig, Config, StorageConfig};
use campus_storage::create_router;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Base of every disk URL the test app hands out
pub const FILES_BASE_URL: &str = "http://localhost/files";

pub const MAX_IMAGE_BYTES: usize = 64 * 1024;

pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

/// Path part of a disk URL, usable against the test server
pub fn local_path(url: &str) -> String {
    url.strip_prefix("http://localhost")
        .unwrap_or(url)
        .to_string()
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub owner: Uuid,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn create_test_config(temp_dir: &TempDir) -> Config {
    let values: HashMap<&str, String> = HashMap::from([
        ("STORAGE_MODE", "auto".to_string()),
        (
            "LOCAL_STORAGE_PATH",
            temp_dir.path().to_string_lossy().into_owned(),
        ),
        ("LOCAL_STORAGE_BASE_URL", FILES_BASE_URL.to_string()),
    ]);
    let storage = StorageConfig::from_lookup(|key| values.get(key).cloned(), 4000)
        .expect("Failed to build storage config");

    Config {
        base: BaseConfig {
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            database_url: None,
            db_max_connections: 1,
            max_file_size_bytes: MAX_IMAGE_BYTES,
            max_video_size_bytes: 1024 * 1024,
            max_document_size_bytes: 1024 * 1024,
            http_concurrency_limit: 64,
        },
        storage,
    }
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = create_test_config(&temp_dir);

    let storage = create_router(&config.storage)
        .await
        .expect("Failed to create storage router");
    let state = Arc::new(AppState::new(config.clone(), Arc::new(storage), None));
    let router = routes::setup_routes(&config, state.clone())
        .await
        .expect("Failed to setup routes");

    TestApp {
        server: TestServer::new(router).expect("Failed to start test server"),
        state,
        owner: Uuid::new_v4(),
        _temp_dir: temp_dir,
    }
}

pub fn image_part(bytes: Vec<u8>, file_name: &str) -> Part {
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_type("image/png")
}

/// Create a course owned by `app.owner` with a thumbnail, returning the JSON body.
pub async fn create_course(app: &TestApp, title: &str) -> serde_json::Value {
    let form = MultipartForm::new()
        .add_text("data", serde_json::json!({ "title": title }).to_string())
        .add_part(
            "thumbnail",
            image_part(fixtures::create_minimal_png(), "thumb.png"),
        );

    let response = app
        .client()
        .post(&api_path("/courses"))
        .add_header(USER_ID_HEADER, app.owner.to_string())
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 201, "{}", response.text());
    response.json::<serde_json::Value>()
}
