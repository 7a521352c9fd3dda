//! Map marker icon selection by severity.

use serde::Serialize;

use crate::report::Severity;

/// Marker pin dimensions in pixels (width, height).
pub const ICON_SIZE: (u32, u32) = (32, 48);

/// Pixel offset of the pin tip from the icon's top-left corner.
pub const ICON_ANCHOR: (i32, i32) = (16, 48);

/// Popup offset relative to the anchor.
pub const POPUP_ANCHOR: (i32, i32) = (0, -48);

/// Pin colour for a report marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerIcon {
    Red,
    Orange,
    Green,
}

impl MarkerIcon {
    /// `Critical -> Red`, `High -> Orange`, anything else (including unset)
    /// `-> Green`.
    pub fn for_severity(severity: Option<Severity>) -> Self {
        match severity {
            Some(Severity::Critical) => MarkerIcon::Red,
            Some(Severity::High) => MarkerIcon::Orange,
            _ => MarkerIcon::Green,
        }
    }

    /// Same mapping from a raw label in either vocabulary.
    pub fn for_label(label: Option<&str>) -> Self {
        Self::for_severity(label.and_then(Severity::from_label))
    }

    pub fn color(self) -> &'static str {
        match self {
            MarkerIcon::Red => "red",
            MarkerIcon::Orange => "orange",
            MarkerIcon::Green => "green",
        }
    }

    /// Inline SVG pin as a `data:` URI, filled with [`color`](Self::color).
    pub fn data_uri(self) -> String {
        format!(
            "data:image/svg+xml;utf8,<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"32\" height=\"48\" viewBox=\"0 0 32 48\">\
             <path fill=\"{}\" stroke=\"black\" stroke-width=\"2\" d=\"M16 1C8 1 1 8 1 16c0 10 15 30 15 30s15-20 15-30C31 8 24 1 16 1z\"/>\
             <circle fill=\"white\" stroke=\"black\" stroke-width=\"2\" cx=\"16\" cy=\"16\" r=\"6\"/></svg>",
            self.color()
        )
    }
}
