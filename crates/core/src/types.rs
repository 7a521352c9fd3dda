/// Report identifiers are server-assigned UUIDs.
pub type ReportId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
