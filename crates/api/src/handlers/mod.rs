//! Request handlers.
//!
//! Handlers delegate to the [`ReportStore`](crowdalert_db::store::ReportStore)
//! held in [`AppState`](crate::state::AppState) and map errors via
//! [`AppError`](crate::error::AppError).

pub mod reports;
pub mod severity;
