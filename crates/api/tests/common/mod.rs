#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use crowdalert_api::config::{GeocoderConfig, LogFormat, ServerConfig, StoreBackend};
use crowdalert_api::router::build_app_router;
use crowdalert_api::state::AppState;
use crowdalert_api::uploads::UploadStore;
use crowdalert_db::store::MemoryReportStore;
use crowdalert_geocode::Geocoder;

/// Smallest byte prefix that sniffs as PNG.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

const BOUNDARY: &str = "crowdalert-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:3000` as CORS origin (matching the dev default),
/// the in-memory store and no geocoder.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".parse().unwrap()],
        request_timeout_secs: 30,
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        store: StoreBackend::Memory,
        database_max_connections: 1,
        geocoder: GeocoderConfig {
            enabled: false,
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        },
        log_format: LogFormat::Pretty,
    }
}

/// A router over an in-memory store plus handles for assertions.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryReportStore>,
    pub upload_dir: tempfile::TempDir,
}

/// Build the full application router with all middleware layers, exactly
/// as `main.rs` does, over a fresh in-memory store.
pub fn build_test_app() -> TestApp {
    build_test_app_with(Arc::new(MemoryReportStore::new()), None)
}

pub fn build_test_app_with(
    store: Arc<MemoryReportStore>,
    geocoder: Option<Arc<dyn Geocoder>>,
) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let config = test_config(upload_dir.path());
    let state = AppState {
        store: store.clone(),
        config: Arc::new(config),
        geocoder,
        uploads: Arc::new(UploadStore::new(upload_dir.path())),
    };
    TestApp {
        app: build_app_router(state),
        store,
        upload_dir,
    }
}

/// Send a GET request and return the response.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

/// Hand-assembled `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str, idempotency_key: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        let mut builder = Request::post(uri).header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(key) = idempotency_key {
            builder = builder.header("idempotency-key", key);
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

/// A complete detailed-form submission.
pub fn fire_report() -> MultipartForm {
    MultipartForm::new()
        .text("description", "Warehouse fire, two people with injury")
        .text("emergencyType", "Fire")
        .text("severity", "High")
        .text("lat", "22.5726")
        .text("lng", "88.3639")
        .text("address", "Howrah, West Bengal")
        .text("phone", "+91 98300 00000")
}
