//! Display status derived from report age.
//!
//! This is a placeholder heuristic, not incident tracking: nothing is
//! persisted and the status advances purely with wall-clock time since the
//! report timestamp. Callers pass `now` explicitly.

use serde::Serialize;

use crate::types::Timestamp;

/// Age (seconds) at which a report leaves `Monitoring`.
pub const VERIFIED_AFTER_SECS: f64 = 5.0;
/// Age (seconds) at which a report leaves `Verified`.
pub const RESPONDING_AFTER_SECS: f64 = 10.0;
/// Age (seconds) at which a report leaves `Responding`.
pub const RESOLVED_AFTER_SECS: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IncidentStatus {
    Monitoring,
    Verified,
    Responding,
    Resolved,
}

impl IncidentStatus {
    /// Bucket an age in seconds. Boundaries belong to the later bucket;
    /// negative ages (clock skew) count as `Monitoring`.
    pub fn for_age_secs(age_secs: f64) -> Self {
        if age_secs < VERIFIED_AFTER_SECS {
            IncidentStatus::Monitoring
        } else if age_secs < RESPONDING_AFTER_SECS {
            IncidentStatus::Verified
        } else if age_secs < RESOLVED_AFTER_SECS {
            IncidentStatus::Responding
        } else {
            IncidentStatus::Resolved
        }
    }

    /// Status at `now` for a report created at `created_at`. A missing
    /// timestamp is treated as "just created".
    pub fn derive(now: Timestamp, created_at: Option<Timestamp>) -> Self {
        let Some(created_at) = created_at else {
            return IncidentStatus::Monitoring;
        };
        let age_ms = (now - created_at).num_milliseconds();
        Self::for_age_secs(age_ms as f64 / 1000.0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Monitoring => "Monitoring",
            IncidentStatus::Verified => "Verified",
            IncidentStatus::Responding => "Responding",
            IncidentStatus::Resolved => "Resolved",
        }
    }
}
