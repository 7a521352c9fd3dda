//! The Report Store seam.
//!
//! [`ReportStore`] is what the HTTP layer holds. [`PgReportStore`] delegates
//! to [`ReportRepo`]; [`MemoryReportStore`] keeps everything in process for
//! development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use crowdalert_core::report::Report;
use crowdalert_core::types::ReportId;
use tokio::sync::RwLock;

use crate::models::report::CreateReport;
use crate::repositories::ReportRepo;
use crate::DbPool;

/// Outcome of [`ReportStore::create`].
#[derive(Debug, Clone)]
pub struct Created {
    pub report: Report,
    /// `true` when the idempotency key matched an earlier report and
    /// nothing new was written.
    pub replayed: bool,
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new report, or return the earlier one created with the
    /// same idempotency key.
    async fn create(&self, input: CreateReport) -> Result<Created, sqlx::Error>;

    /// All reports, newest first.
    async fn list(&self) -> Result<Vec<Report>, sqlx::Error>;

    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, sqlx::Error>;

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Report>, sqlx::Error>;

    /// Delete a report. Returns `true` if it existed.
    async fn delete(&self, id: ReportId) -> Result<bool, sqlx::Error>;

    async fn health_check(&self) -> Result<(), sqlx::Error>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

pub struct PgReportStore {
    pool: DbPool,
}

impl PgReportStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn create(&self, input: CreateReport) -> Result<Created, sqlx::Error> {
        let id = uuid::Uuid::new_v4();
        if let Some(report) = ReportRepo::insert(&self.pool, id, &input).await? {
            return Ok(Created {
                report,
                replayed: false,
            });
        }

        // Conflict on the idempotency key: the insert was skipped.
        let key = input.idempotency_key.as_deref().ok_or(sqlx::Error::RowNotFound)?;
        let report = ReportRepo::find_by_idempotency_key(&self.pool, key)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(Created {
            report,
            replayed: true,
        })
    }

    async fn list(&self) -> Result<Vec<Report>, sqlx::Error> {
        ReportRepo::list(&self.pool).await
    }

    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, sqlx::Error> {
        ReportRepo::find_by_id(&self.pool, id).await
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Report>, sqlx::Error> {
        ReportRepo::find_by_idempotency_key(&self.pool, key).await
    }

    async fn delete(&self, id: ReportId) -> Result<bool, sqlx::Error> {
        ReportRepo::delete(&self.pool, id).await
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    /// Insertion order.
    reports: Vec<Report>,
    by_key: HashMap<String, ReportId>,
}

/// Process-local store. Check-and-insert happens under one write lock, so
/// concurrent creates with the same idempotency key yield one report.
#[derive(Default)]
pub struct MemoryReportStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with pre-existing reports (kept as given).
    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                reports,
                by_key: HashMap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.reports.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn create(&self, mut input: CreateReport) -> Result<Created, sqlx::Error> {
        let mut inner = self.inner.write().await;

        if let Some(key) = input.idempotency_key.as_ref() {
            if let Some(id) = inner.by_key.get(key) {
                let report = inner
                    .reports
                    .iter()
                    .find(|r| r.id == *id)
                    .cloned()
                    .ok_or(sqlx::Error::RowNotFound)?;
                return Ok(Created {
                    report,
                    replayed: true,
                });
            }
        }

        let id = uuid::Uuid::new_v4();
        if let Some(key) = input.idempotency_key.take() {
            inner.by_key.insert(key, id);
        }
        let report = input.into_report(id, chrono::Utc::now());
        inner.reports.push(report.clone());
        Ok(Created {
            report,
            replayed: false,
        })
    }

    async fn list(&self) -> Result<Vec<Report>, sqlx::Error> {
        let inner = self.inner.read().await;
        let mut reports: Vec<Report> = inner.reports.iter().rev().cloned().collect();
        reports.sort_by_key(|r| std::cmp::Reverse(r.timestamp));
        Ok(reports)
    }

    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, sqlx::Error> {
        let inner = self.inner.read().await;
        Ok(inner.reports.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Report>, sqlx::Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_key
            .get(key)
            .and_then(|id| inner.reports.iter().find(|r| r.id == *id))
            .cloned())
    }

    async fn delete(&self, id: ReportId) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.write().await;
        let before = inner.reports.len();
        inner.reports.retain(|r| r.id != id);
        let removed = inner.reports.len() != before;
        if removed {
            inner.by_key.retain(|_, v| *v != id);
        }
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
