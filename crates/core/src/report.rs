//! The report entity and its two vocabularies.
//!
//! Two submission shapes have historically written into one collection:
//! `description + lat + lng + address` with `Severe/Moderate/Minor`, and
//! `emergencyType + location + phone + photo` with `Low/Medium/High/Critical`.
//! The canonical schema is the second vocabulary with the first shape's field
//! names; legacy labels and field names are accepted on read and mapped here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::geo::Position;
use crate::types::{ReportId, Timestamp};

// ---------------------------------------------------------------------------
// Emergency type
// ---------------------------------------------------------------------------

/// Category of the reported incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EmergencyType {
    Fire,
    Flood,
    Earthquake,
    Accident,
    Medical,
    Crime,
    Other,
}

impl EmergencyType {
    /// All types in form display order.
    pub const ALL: [EmergencyType; 7] = [
        EmergencyType::Fire,
        EmergencyType::Flood,
        EmergencyType::Earthquake,
        EmergencyType::Accident,
        EmergencyType::Medical,
        EmergencyType::Crime,
        EmergencyType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmergencyType::Fire => "Fire",
            EmergencyType::Flood => "Flood",
            EmergencyType::Earthquake => "Earthquake",
            EmergencyType::Accident => "Accident",
            EmergencyType::Medical => "Medical",
            EmergencyType::Crime => "Crime",
            EmergencyType::Other => "Other",
        }
    }
}

impl fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmergencyType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        EmergencyType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid emergency type '{label}'. Must be one of: {:?}",
                    EmergencyType::ALL.map(EmergencyType::as_str)
                ))
            })
    }
}

impl<'de> Deserialize<'de> for EmergencyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Canonical severity scale.
///
/// Legacy labels map onto it: `Severe -> Critical`, `Moderate -> High`,
/// `Minor -> Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    /// Parse a canonical or legacy label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Severity> {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "low" | "minor" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" | "moderate" => Some(Severity::High),
            "critical" | "severe" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::from_label(s).ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid severity '{}'. Must be one of: {:?}",
                s.trim(),
                Severity::ALL.map(Severity::as_str)
            ))
        })
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A persisted emergency report in its canonical wire shape.
///
/// Deserialization is lenient so that rows written by the legacy form
/// (`type`, `location`, `time`, string coordinates, legacy severity labels)
/// still load. Serialization always emits the canonical field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    #[serde(
        rename = "emergencyType",
        alias = "type",
        default,
        deserialize_with = "lenient_emergency_type"
    )]
    pub emergency_type: Option<EmergencyType>,
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lng: Option<f64>,
    #[serde(alias = "location", default, deserialize_with = "non_empty_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub phone: Option<String>,
    #[serde(
        alias = "photo_url",
        alias = "photo",
        default,
        deserialize_with = "non_empty_string"
    )]
    pub image_url: Option<String>,
    #[serde(alias = "time", default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<Timestamp>,
}

impl Report {
    /// Structured position, if both coordinates are stored.
    pub fn stored_position(&self) -> Option<Position> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Position::new(lat, lng)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

/// Unknown legacy types (e.g. free-text categories) degrade to `Other`.
fn lenient_emergency_type<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EmergencyType>, D::Error> {
    let label = non_empty_string(deserializer)?;
    Ok(label.map(|l| l.parse().unwrap_or(EmergencyType::Other)))
}

fn lenient_severity<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Severity>, D::Error> {
    let label = non_empty_string(deserializer)?;
    Ok(label.as_deref().and_then(Severity::from_label))
}

/// Coordinates may arrive as numbers, numeric strings, empty strings or null.
fn lenient_coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) if n.is_finite() => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Timestamp>, D::Error> {
    let text = non_empty_string(deserializer)?;
    Ok(text.as_deref().and_then(parse_timestamp))
}

fn non_empty_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Parse an RFC 3339 timestamp, or a naive ISO datetime interpreted as UTC.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
