//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{body_json, build_test_app, get, test_config};
use crowdalert_api::router::build_app_router;
use crowdalert_api::state::AppState;
use crowdalert_api::uploads::UploadStore;
use crowdalert_core::report::Report;
use crowdalert_core::types::ReportId;
use crowdalert_db::models::report::CreateReport;
use crowdalert_db::store::{Created, ReportStore};
use tower::ServiceExt;

/// A store whose connection pool never hands out a connection.
struct UnreachableStore;

#[async_trait]
impl ReportStore for UnreachableStore {
    async fn create(&self, _input: CreateReport) -> Result<Created, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn list(&self) -> Result<Vec<Report>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn find_by_id(&self, _id: ReportId) -> Result<Option<Report>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn find_by_idempotency_key(&self, _key: &str) -> Result<Option<Report>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn delete(&self, _id: ReportId) -> Result<bool, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }
}

fn unreachable_app(upload_dir: &std::path::Path) -> Router {
    build_app_router(AppState {
        store: Arc::new(UnreachableStore),
        config: Arc::new(test_config(upload_dir)),
        geocoder: None,
        uploads: Arc::new(UploadStore::new(upload_dir)),
    })
}

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let t = build_test_app();
    let response = get(t.app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["store_healthy"], true);
}

// ---------------------------------------------------------------------------
// Test: an unreachable store degrades health and fails reads with 503
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_store_reports_degraded() {
    let dir = tempfile::tempdir().unwrap();

    let json = body_json(get(unreachable_app(dir.path()), "/health").await).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["store_healthy"], false);

    let response = get(unreachable_app(dir.path()), "/api/reports").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "STORE_UNAVAILABLE");
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let t = build_test_app();
    let response = get(t.app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let t = build_test_app();
    let response = get(t.app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");

    // The value should be a valid UUID (36 chars with hyphens).
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

// ---------------------------------------------------------------------------
// Test: CORS preflight allows the idempotency header
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_allows_report_submission() {
    let t = build_test_app();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/reports")
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "idempotency-key")
        .body(Body::empty())
        .unwrap();

    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    let allow_origin = headers
        .get("access-control-allow-origin")
        .expect("Missing Access-Control-Allow-Origin header")
        .to_str()
        .unwrap();
    assert_eq!(allow_origin, "http://localhost:3000");

    let allow_headers = headers
        .get("access-control-allow-headers")
        .expect("Missing Access-Control-Allow-Headers header")
        .to_str()
        .unwrap();
    assert!(
        allow_headers.contains("idempotency-key"),
        "Allow-Headers should contain idempotency-key, got: {allow_headers}"
    );
}
