//! Repository for the `reports` table.

use crowdalert_core::report::Report;
use crowdalert_core::types::ReportId;
use sqlx::PgPool;

use crate::models::report::{CreateReport, ReportRow};

/// Column list for `reports` queries.
const COLUMNS: &str = "\
    id, emergency_type, severity, description, lat, lng, \
    address, phone, image_url, idempotency_key, created_at";

/// Provides persistence operations for reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a report. Returns `None` when `idempotency_key` already
    /// exists; the caller then loads the original with
    /// [`find_by_idempotency_key`](Self::find_by_idempotency_key).
    pub async fn insert(
        pool: &PgPool,
        id: ReportId,
        input: &CreateReport,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports \
                (id, emergency_type, severity, description, lat, lng, \
                 address, phone, image_url, idempotency_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (idempotency_key) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .bind(input.emergency_type.map(|t| t.as_str()))
            .bind(input.severity.as_str())
            .bind(&input.description)
            .bind(input.lat)
            .bind(input.lng)
            .bind(&input.address)
            .bind(&input.phone)
            .bind(&input.image_url)
            .bind(&input.idempotency_key)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Report::from))
    }

    /// All reports, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports ORDER BY created_at DESC, id");
        let rows = sqlx::query_as::<_, ReportRow>(&query)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Report::from).collect())
    }

    pub async fn find_by_id(pool: &PgPool, id: ReportId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Report::from))
    }

    pub async fn find_by_idempotency_key(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE idempotency_key = $1");
        let row = sqlx::query_as::<_, ReportRow>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Report::from))
    }

    /// Delete a report. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: ReportId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
