//! Positions, the `Lat: <f>, Lng: <f>` text encoding, and map viewports.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::report::Report;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Map center used when no report position resolves (India).
pub const DEFAULT_CENTER: Position = Position {
    lat: 20.5937,
    lng: 78.9629,
};

/// Zoom level paired with [`DEFAULT_CENTER`].
pub const DEFAULT_ZOOM: u8 = 4;

/// Zoom level used after a position is picked or located.
pub const SELECTED_ZOOM: u8 = 14;

/// Padding (pixels, each axis) applied when fitting the viewport to markers.
pub const FIT_PADDING_PX: u32 = 40;

/// Matches the textual coordinate fallback written into `address`.
static COORDINATE_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Lat:\s*([\d.\-]+),\s*Lng:\s*([\d.\-]+)").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both coordinates finite and within `[-90, 90]` / `[-180, 180]`.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Encode as the `Lat: <f>, Lng: <f>` address fallback.
    pub fn to_coordinate_text(&self) -> String {
        format!("Lat: {}, Lng: {}", self.lat, self.lng)
    }
}

/// Extract a position from text containing `Lat: <f>, Lng: <f>`.
///
/// Returns `None` when the pattern is missing, a number does not parse, or
/// the result is out of range.
pub fn parse_coordinate_text(text: &str) -> Option<Position> {
    let caps = COORDINATE_TEXT_RE.captures(text)?;
    let lat = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let lng = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some(Position::new(lat, lng)).filter(Position::is_valid)
}

/// Resolve a report's position: structured coordinates first, then the
/// coordinate text in `address`.
pub fn recover_position(report: &Report) -> Option<Position> {
    if let Some(pos) = report.stored_position().filter(Position::is_valid) {
        return Some(pos);
    }
    report.address.as_deref().and_then(parse_coordinate_text)
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box of a set of positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Smallest box containing every position; `None` for an empty set.
    pub fn enclosing<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        positions.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => GeoBounds {
                    south: p.lat,
                    west: p.lng,
                    north: p.lat,
                    east: p.lng,
                },
                Some(b) => GeoBounds {
                    south: b.south.min(p.lat),
                    west: b.west.min(p.lng),
                    north: b.north.max(p.lat),
                    east: b.east.max(p.lng),
                },
            })
        })
    }

    pub fn center(&self) -> Position {
        Position::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}

/// What the map should show for a set of plotted positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MapViewport {
    /// Fit the viewport to `bounds` with `padding_px` on each side.
    Fit { bounds: GeoBounds, padding_px: u32 },
    /// Nothing to plot: fixed center and zoom.
    Default { center: Position, zoom: u8 },
}

impl MapViewport {
    pub fn for_positions(positions: &[Position]) -> Self {
        match GeoBounds::enclosing(positions) {
            Some(bounds) => MapViewport::Fit {
                bounds,
                padding_px: FIT_PADDING_PX,
            },
            None => MapViewport::Default {
                center: DEFAULT_CENTER,
                zoom: DEFAULT_ZOOM,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
