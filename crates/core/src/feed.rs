//! Feed shaping: severity filtering, the home page "recent activity"
//! summary, and relative-time labels.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::report::{Report, Severity};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Severity filter
// ---------------------------------------------------------------------------

/// Feed filter; `All` is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeverityFilter {
    #[default]
    All,
    Only(Severity),
}

impl SeverityFilter {
    /// Equality on the canonical severity, so a legacy `Severe` report
    /// matches a `Critical` filter.
    pub fn matches(&self, report: &Report) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Only(wanted) => report.severity == Some(*wanted),
        }
    }

    pub fn apply<'a>(&self, reports: &'a [Report]) -> Vec<&'a Report> {
        reports.iter().filter(|r| self.matches(r)).collect()
    }
}

impl FromStr for SeverityFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(SeverityFilter::All)
        } else {
            s.parse().map(SeverityFilter::Only)
        }
    }
}

// ---------------------------------------------------------------------------
// Home feed
// ---------------------------------------------------------------------------

/// Number of entries on the home page activity feed.
pub const HOME_FEED_LIMIT: usize = 5;

/// One line of the activity feed: "<kind> reported in <location>, <time ago>".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub kind: String,
    pub location: String,
    pub time: Timestamp,
}

fn demo_time(text: &str) -> Timestamp {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(Timestamp::UNIX_EPOCH)
}

/// Fixed feed shown when the store cannot be read, so the page never
/// renders empty.
pub fn demo_feed() -> Vec<FeedItem> {
    [
        ("Flood", "Kolkata, West Bengal", "2024-07-24T10:00:00Z"),
        ("Fire", "Delhi", "2024-07-24T09:55:00Z"),
        ("Power Outage", "Noida", "2024-07-24T09:50:00Z"),
    ]
    .into_iter()
    .map(|(kind, location, time)| FeedItem {
        kind: kind.to_string(),
        location: location.to_string(),
        time: demo_time(time),
    })
    .collect()
}

/// Most recent `limit` reports, newest first, as feed items.
///
/// Reports without a timestamp sort as the epoch; their item shows `now`.
pub fn summarize(reports: &[Report], now: Timestamp, limit: usize) -> Vec<FeedItem> {
    let mut sorted: Vec<&Report> = reports.iter().collect();
    sorted.sort_by_key(|r| std::cmp::Reverse(r.timestamp.unwrap_or(Timestamp::UNIX_EPOCH)));

    sorted
        .into_iter()
        .take(limit)
        .map(|r| FeedItem {
            kind: r
                .emergency_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "Incident".to_string()),
            location: r.address.clone().unwrap_or_else(|| "Unknown".to_string()),
            time: r.timestamp.unwrap_or(now),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Relative time
// ---------------------------------------------------------------------------

/// Coarse label for an age in whole minutes. Negative ages read as `just now`.
pub fn time_ago_minutes(diff_minutes: i64) -> String {
    if diff_minutes < 1 {
        return "just now".to_string();
    }
    if diff_minutes == 1 {
        return "1 min ago".to_string();
    }
    if diff_minutes < 60 {
        return format!("{diff_minutes} min ago");
    }
    let hours = diff_minutes / 60;
    if hours == 1 {
        return "1 hour ago".to_string();
    }
    if hours < 24 {
        return format!("{hours} hours ago");
    }
    let days = hours / 24;
    if days == 1 {
        "1 day ago".to_string()
    } else {
        format!("{days} days ago")
    }
}

pub fn time_ago(now: Timestamp, then: Timestamp) -> String {
    time_ago_minutes((now - then).num_minutes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::EmergencyType;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 7, 24, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn report(minute: Option<i64>, kind: Option<EmergencyType>, address: Option<&str>) -> Report {
        Report {
            id: uuid::Uuid::new_v4(),
            emergency_type: kind,
            severity: None,
            description: "x".into(),
            lat: None,
            lng: None,
            address: address.map(str::to_string),
            phone: None,
            image_url: None,
            timestamp: minute.map(at),
        }
    }

    #[test]
    fn relative_time_labels() {
        assert_eq!(time_ago_minutes(0), "just now");
        assert_eq!(time_ago_minutes(-3), "just now");
        assert_eq!(time_ago_minutes(1), "1 min ago");
        assert_eq!(time_ago_minutes(59), "59 min ago");
        assert_eq!(time_ago_minutes(60), "1 hour ago");
        assert_eq!(time_ago_minutes(119), "1 hour ago");
        assert_eq!(time_ago_minutes(120), "2 hours ago");
        assert_eq!(time_ago_minutes(1439), "23 hours ago");
        assert_eq!(time_ago_minutes(1440), "1 day ago");
        assert_eq!(time_ago_minutes(4320), "3 days ago");
    }

    #[test]
    fn time_ago_truncates_to_minutes() {
        let then = at(0);
        assert_eq!(time_ago(then + Duration::seconds(59), then), "just now");
        assert_eq!(time_ago(then + Duration::seconds(61), then), "1 min ago");
    }

    #[test]
    fn summary_keeps_five_most_recent_in_order() {
        let minutes = [3, 7, 1, 8, 2, 6, 4, 5];
        let reports: Vec<Report> = minutes
            .iter()
            .map(|&m| report(Some(m), None, Some(&format!("place {m}"))))
            .collect();

        let feed = summarize(&reports, at(100), HOME_FEED_LIMIT);
        let times: Vec<Timestamp> = feed.iter().map(|f| f.time).collect();
        assert_eq!(times, vec![at(8), at(7), at(6), at(5), at(4)]);
        assert_eq!(feed[0].location, "place 8");
    }

    #[test]
    fn summary_field_fallbacks() {
        let now = at(100);
        let reports = vec![
            report(Some(5), Some(EmergencyType::Fire), Some("Delhi")),
            report(None, None, None),
        ];
        let feed = summarize(&reports, now, HOME_FEED_LIMIT);
        assert_eq!(feed[0].kind, "Fire");
        assert_eq!(feed[1].kind, "Incident");
        assert_eq!(feed[1].location, "Unknown");
        assert_eq!(feed[1].time, now);
    }

    #[test]
    fn demo_feed_has_three_fixed_items() {
        let demo = demo_feed();
        assert_eq!(demo.len(), 3);
        assert_eq!(demo[2].kind, "Power Outage");
        assert!(demo.windows(2).all(|w| w[0].time > w[1].time));
    }

    #[test]
    fn severity_filter_matches_canonical_value() {
        let mut severe = report(Some(1), None, None);
        severe.severity = Severity::from_label("Severe");
        let minor = report(Some(2), None, None);
        let reports = vec![severe, minor];

        let critical: SeverityFilter = "Critical".parse().unwrap();
        assert_eq!(critical.apply(&reports).len(), 1);
        assert_eq!("All".parse::<SeverityFilter>().unwrap().apply(&reports).len(), 2);
        assert!("Whatever".parse::<SeverityFilter>().is_err());
    }
}
