pub mod health;
pub mod reports;

use axum::routing::post;
use axum::Router;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /reports                  list, create
/// /reports/{id}             get, delete
/// /severity                 keyword severity suggestion (POST)
/// /uploads/{filename}       stored report images
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/reports", reports::router())
        .route("/severity", post(handlers::severity::classify))
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
}
