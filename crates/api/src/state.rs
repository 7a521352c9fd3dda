use std::sync::Arc;

use crowdalert_db::store::ReportStore;
use crowdalert_geocode::Geocoder;

use crate::config::ServerConfig;
use crate::uploads::UploadStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Report persistence (PostgreSQL or in-memory).
    pub store: Arc<dyn ReportStore>,
    pub config: Arc<ServerConfig>,
    /// Forward geocoder for address-only submissions. `None` disables it.
    pub geocoder: Option<Arc<dyn Geocoder>>,
    /// Image files attached to reports.
    pub uploads: Arc<UploadStore>,
}
