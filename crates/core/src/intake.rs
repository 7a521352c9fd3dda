//! Normalization of submitted report fields into a canonical new report.
//!
//! Accepts both the canonical multipart field names and the legacy ones
//! (`location` for `address`), both severity vocabularies, string
//! coordinates, and the `Lat: <f>, Lng: <f>` address encoding.

use crate::classify::classify_severity;
use crate::error::CoreError;
use crate::geo::{parse_coordinate_text, Position};
use crate::report::{EmergencyType, Severity};
use crate::validation::{
    parse_coordinate, validate_address, validate_description, validate_phone, validate_position,
};

/// Text fields exactly as received. Blank values count as absent.
#[derive(Debug, Default, Clone)]
pub struct RawSubmission {
    pub description: Option<String>,
    pub emergency_type: Option<String>,
    pub severity: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub address: Option<String>,
    /// Legacy name for `address`.
    pub location: Option<String>,
    pub phone: Option<String>,
}

impl RawSubmission {
    /// Assign a text field by its multipart name. Returns `false` for names
    /// this submission does not know.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "description" => &mut self.description,
            "emergencyType" | "type" => &mut self.emergency_type,
            "severity" => &mut self.severity,
            "lat" => &mut self.lat,
            "lng" => &mut self.lng,
            "address" => &mut self.address,
            "location" => &mut self.location,
            "phone" => &mut self.phone,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// A validated report awaiting persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub emergency_type: Option<EmergencyType>,
    pub severity: Severity,
    /// Whether `severity` came from the keyword classifier.
    pub severity_inferred: bool,
    pub description: String,
    pub position: Option<Position>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl NewReport {
    /// Only a free-text address is known; a forward geocode may fill in
    /// the position.
    pub fn needs_geocoding(&self) -> bool {
        self.position.is_none() && self.address.is_some()
    }

    /// Attach a geocoded position. Out-of-range results are rejected.
    pub fn with_geocoded_position(mut self, position: Position) -> Result<Self, CoreError> {
        validate_position(&position)?;
        self.position = Some(position);
        Ok(self)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Validate and canonicalize a raw submission.
pub fn normalize(raw: RawSubmission) -> Result<NewReport, CoreError> {
    let description = present(raw.description).unwrap_or_default();
    validate_description(&description)?;

    let emergency_type = present(raw.emergency_type)
        .map(|t| t.parse::<EmergencyType>())
        .transpose()?;

    let (severity, severity_inferred) = match present(raw.severity) {
        Some(label) => (label.parse::<Severity>()?, false),
        None => (classify_severity(&description), true),
    };

    let lat = parse_coordinate("lat", raw.lat.as_deref().unwrap_or(""))?;
    let lng = parse_coordinate("lng", raw.lng.as_deref().unwrap_or(""))?;
    let mut position = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Position::new(lat, lng)),
        (None, None) => None,
        _ => {
            return Err(CoreError::Validation(
                "Both lat and lng must be provided together".to_string(),
            ))
        }
    };

    let address = present(raw.address).or_else(|| present(raw.location));
    if let Some(ref addr) = address {
        validate_address(addr)?;
        if position.is_none() {
            position = parse_coordinate_text(addr);
        }
    }

    if let Some(ref pos) = position {
        validate_position(pos)?;
    }
    if position.is_none() && address.is_none() {
        return Err(CoreError::Validation(
            "A location is required: provide lat/lng or an address".to_string(),
        ));
    }

    let phone = present(raw.phone);
    if let Some(ref p) = phone {
        validate_phone(p)?;
    }

    Ok(NewReport {
        emergency_type,
        severity,
        severity_inferred,
        description,
        position,
        address,
        phone,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
