//! Client-side submission drafts: required-field checks per form variant and
//! the canonical multipart payload they produce.
//!
//! Validation here never touches the network. A draft that fails yields a
//! [`ValidationError`] whose `Display` is the inline message to show.

use crate::geo::Position;
use crate::report::{EmergencyType, Severity};

/// Which submission form the draft came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormVariant {
    /// Description, a position picked on the map or from the device, an
    /// optional severity and an optional image.
    #[default]
    Quick,
    /// Emergency type, severity, a free-text or autocompleted location,
    /// description, optional phone and optional photo.
    Detailed,
}

/// The single image attached to a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Description and location are required.")]
    DescriptionOrLocationMissing,

    #[error("Please fill in all required fields.")]
    RequiredFieldsMissing,
}

/// Form state as the user has entered it so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionDraft {
    pub variant: FormVariant,
    pub description: String,
    pub emergency_type: Option<EmergencyType>,
    pub severity: Option<Severity>,
    pub position: Option<Position>,
    /// Reverse-geocoded address (quick form) or the location text (detailed form).
    pub address: String,
    pub phone: String,
    pub image: Option<ImageAttachment>,
}

/// A draft that passed its variant's required-field check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub description: String,
    pub emergency_type: Option<EmergencyType>,
    pub severity: Option<Severity>,
    pub position: Option<Position>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image: Option<ImageAttachment>,
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl SubmissionDraft {
    pub fn new(variant: FormVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Required fields:
    /// - quick: description and a position
    /// - detailed: emergency type, severity, location text and description
    pub fn validate(&self) -> Result<ValidatedSubmission, ValidationError> {
        let description = non_blank(&self.description);
        let address = non_blank(&self.address);

        match self.variant {
            FormVariant::Quick => {
                if description.is_none() || self.position.is_none() {
                    return Err(ValidationError::DescriptionOrLocationMissing);
                }
            }
            FormVariant::Detailed => {
                if self.emergency_type.is_none()
                    || self.severity.is_none()
                    || address.is_none()
                    || description.is_none()
                {
                    return Err(ValidationError::RequiredFieldsMissing);
                }
            }
        }

        Ok(ValidatedSubmission {
            description: description.unwrap_or_default(),
            emergency_type: self.emergency_type,
            severity: self.severity,
            position: self.position,
            address,
            phone: non_blank(&self.phone),
            image: self.image.clone(),
        })
    }
}

impl ValidatedSubmission {
    /// Multipart text fields in canonical names, absent values omitted.
    /// The image travels separately as the `image` file part.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("description", self.description.clone())];
        if let Some(t) = self.emergency_type {
            fields.push(("emergencyType", t.as_str().to_string()));
        }
        if let Some(s) = self.severity {
            fields.push(("severity", s.as_str().to_string()));
        }
        if let Some(p) = self.position {
            fields.push(("lat", p.lat.to_string()));
            fields.push(("lng", p.lng.to_string()));
        }
        if let Some(ref a) = self.address {
            fields.push(("address", a.clone()));
        }
        if let Some(ref p) = self.phone {
            fields.push(("phone", p.clone()));
        }
        fields
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
