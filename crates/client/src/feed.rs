//! Feed, live map and home page view models.

use std::sync::Arc;

use crowdalert_core::feed::{demo_feed, summarize, time_ago, FeedItem, SeverityFilter, HOME_FEED_LIMIT};
use crowdalert_core::geo::{recover_position, MapViewport, Position};
use crowdalert_core::marker::MarkerIcon;
use crowdalert_core::report::Report;
use crowdalert_core::status::IncidentStatus;
use crowdalert_core::types::{ReportId, Timestamp};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::ReportsApi;
use crate::cache::{ReportCache, Reports};
use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Feed / live map
// ---------------------------------------------------------------------------

/// A report card in the live feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveEntry<'a> {
    pub report: &'a Report,
    pub status: IncidentStatus,
    pub time_ago: Option<String>,
}

/// One plotted report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub report_id: ReportId,
    pub position: Position,
    pub icon: MarkerIcon,
    pub title: String,
    pub description: String,
}

impl MapMarker {
    fn for_report(report: &Report) -> Option<Self> {
        let position = recover_position(report)?;
        Some(Self {
            report_id: report.id,
            position,
            icon: MarkerIcon::for_severity(report.severity),
            title: report
                .emergency_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "Incident".to_string()),
            description: report.description.clone(),
        })
    }
}

/// The report list and map, filtered by severity.
pub struct FeedView {
    api: Arc<dyn ReportsApi>,
    cache: Arc<ReportCache>,
    filter: SeverityFilter,
    reports: Reports,
}

impl FeedView {
    pub fn new(api: Arc<dyn ReportsApi>, cache: Arc<ReportCache>) -> Self {
        Self {
            api,
            cache,
            filter: SeverityFilter::All,
            reports: Arc::default(),
        }
    }

    /// Read the collection through the shared cache. On failure the view
    /// keeps what it had.
    pub async fn load(&mut self, cancel: &CancellationToken) -> Result<(), ClientError> {
        match self.cache.reports(Arc::clone(&self.api), cancel).await {
            Ok(reports) => {
                self.reports = reports;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load report feed");
                Err(e)
            }
        }
    }

    pub fn filter(&self) -> SeverityFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: SeverityFilter) {
        self.filter = filter;
    }

    /// Loaded reports, unfiltered.
    pub fn all(&self) -> &[Report] {
        &self.reports
    }

    /// Reports passing the filter, in store order.
    pub fn entries(&self) -> Vec<&Report> {
        self.filter.apply(&self.reports)
    }

    /// Filtered reports with their age-derived status.
    pub fn live_entries(&self, now: Timestamp) -> Vec<LiveEntry<'_>> {
        self.entries()
            .into_iter()
            .map(|report| LiveEntry {
                report,
                status: IncidentStatus::derive(now, report.timestamp),
                time_ago: report.timestamp.map(|t| time_ago(now, t)),
            })
            .collect()
    }

    /// Markers for filtered reports whose position can be recovered. The
    /// rest still appear in [`entries`](Self::entries).
    pub fn markers(&self) -> Vec<MapMarker> {
        self.entries()
            .into_iter()
            .filter_map(MapMarker::for_report)
            .collect()
    }

    pub fn viewport(&self) -> MapViewport {
        let positions: Vec<Position> = self.markers().iter().map(|m| m.position).collect();
        MapViewport::for_positions(&positions)
    }
}

// ---------------------------------------------------------------------------
// Home feed
// ---------------------------------------------------------------------------

/// The home page "recent activity" list.
pub struct HomeFeed {
    api: Arc<dyn ReportsApi>,
    cache: Arc<ReportCache>,
}

impl HomeFeed {
    pub fn new(api: Arc<dyn ReportsApi>, cache: Arc<ReportCache>) -> Self {
        Self { api, cache }
    }

    /// The five most recent reports, or the demo feed when the store cannot
    /// be read or has nothing yet.
    pub async fn load(&self, now: Timestamp, cancel: &CancellationToken) -> Vec<FeedItem> {
        match self.cache.reports(Arc::clone(&self.api), cancel).await {
            Ok(reports) if !reports.is_empty() => summarize(&reports, now, HOME_FEED_LIMIT),
            Ok(_) => demo_feed(),
            Err(e) => {
                tracing::debug!(error = %e, "Home feed falling back to demo data");
                demo_feed()
            }
        }
    }
}

/// "<kind> reported in <location>, <time ago>".
pub fn describe(item: &FeedItem, now: Timestamp) -> String {
    format!(
        "{} reported in {}, {}",
        item.kind,
        item.location,
        time_ago(now, item.time)
    )
}
