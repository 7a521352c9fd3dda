//! Route definitions for the report collection.
//!
//! Mounted at `/api/reports` by `api_routes()`, and at `/reports` for
//! clients still using the unprefixed path.

use axum::routing::get;
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Report routes.
///
/// ```text
/// GET    /        -> list_reports
/// POST   /        -> create_report
/// GET    /{id}    -> get_report
/// DELETE /{id}    -> delete_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(reports::list_reports).post(reports::create_report))
        .route("/{id}", get(reports::get_report).delete(reports::delete_report))
}
