//! Report row model and create DTO.

use crowdalert_core::intake::NewReport;
use crowdalert_core::report::{EmergencyType, Report, Severity};
use crowdalert_core::types::{ReportId, Timestamp};
use sqlx::FromRow;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: ReportId,
    pub emergency_type: Option<String>,
    pub severity: Option<String>,
    pub description: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: Timestamp,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        let emergency_type = row.emergency_type.as_deref().and_then(|t| {
            t.parse::<EmergencyType>()
                .map_err(|e| tracing::warn!(report_id = %row.id, error = %e, "Unreadable stored emergency type"))
                .ok()
        });
        Report {
            id: row.id,
            emergency_type,
            severity: row.severity.as_deref().and_then(Severity::from_label),
            description: row.description,
            lat: row.lat,
            lng: row.lng,
            address: row.address,
            phone: row.phone,
            image_url: row.image_url,
            timestamp: Some(row.created_at),
        }
    }
}

/// DTO for inserting a report. The store assigns `id` and the timestamp.
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub emergency_type: Option<EmergencyType>,
    pub severity: Severity,
    pub description: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub idempotency_key: Option<String>,
}

impl CreateReport {
    pub fn new(report: NewReport, image_url: Option<String>, idempotency_key: Option<String>) -> Self {
        Self {
            emergency_type: report.emergency_type,
            severity: report.severity,
            description: report.description,
            lat: report.position.map(|p| p.lat),
            lng: report.position.map(|p| p.lng),
            address: report.address,
            phone: report.phone,
            image_url,
            idempotency_key,
        }
    }

    /// Materialize the report this DTO would create.
    pub fn into_report(self, id: ReportId, created_at: Timestamp) -> Report {
        Report {
            id,
            emergency_type: self.emergency_type,
            severity: Some(self.severity),
            description: self.description,
            lat: self.lat,
            lng: self.lng,
            address: self.address,
            phone: self.phone,
            image_url: self.image_url,
            timestamp: Some(created_at),
        }
    }
}
