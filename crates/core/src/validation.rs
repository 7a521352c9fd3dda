//! Field limits and validators shared by the store and its clients.

use crate::error::CoreError;
use crate::geo::Position;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum length for the description field (characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum length for the free-text address / location field.
pub const MAX_ADDRESS_LENGTH: usize = 1_000;

/// Maximum length for the contact phone field.
pub const MAX_PHONE_LENGTH: usize = 32;

/// Maximum length for an `Idempotency-Key` header value.
pub const MAX_IDEMPOTENCY_KEY_LENGTH: usize = 128;

/// Image file extensions accepted for the report photo.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Description must be non-blank and within the length limit.
pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation("Description is required".to_string()));
    }
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

pub fn validate_address(address: &str) -> Result<(), CoreError> {
    let len = address.chars().count();
    if len > MAX_ADDRESS_LENGTH {
        return Err(CoreError::Validation(format!(
            "Location exceeds maximum length of {MAX_ADDRESS_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// Digits, spaces and `+-()` only, within the length limit.
pub fn validate_phone(phone: &str) -> Result<(), CoreError> {
    if phone.chars().count() > MAX_PHONE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Phone exceeds maximum length of {MAX_PHONE_LENGTH} characters"
        )));
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    {
        return Err(CoreError::Validation(format!(
            "Invalid phone number '{phone}'"
        )));
    }
    Ok(())
}

pub fn validate_position(position: &Position) -> Result<(), CoreError> {
    if position.is_valid() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Coordinates out of range: lat {} must be within [-90, 90], lng {} within [-180, 180]",
            position.lat, position.lng
        )))
    }
}

pub fn validate_idempotency_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Idempotency-Key must be 1-{MAX_IDEMPOTENCY_KEY_LENGTH} characters"
        )));
    }
    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(CoreError::Validation(
            "Idempotency-Key must be printable ASCII".to_string(),
        ));
    }
    Ok(())
}

/// Lower-cased extension of `file_name`, if it is a supported image type.
pub fn image_extension(file_name: &str) -> Result<String, CoreError> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported image format '.{ext}'. Supported: {SUPPORTED_IMAGE_EXTENSIONS:?}"
        )))
    }
}

/// Parse one coordinate from a form field. Blank means absent.
pub fn parse_coordinate(name: &str, text: &str) -> Result<Option<f64>, CoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| CoreError::Validation(format!("Invalid {name} '{text}'")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_description_is_invalid() {
        assert!(validate_description("").is_err());
        assert!(validate_description("   \n").is_err());
        assert!(validate_description("Building on fire").is_ok());
    }

    #[test]
    fn description_over_limit_is_invalid() {
        let desc = "a".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert!(validate_description(&desc).is_err());
        assert!(validate_description(&desc[1..]).is_ok());
    }

    #[test]
    fn phone_characters() {
        assert!(validate_phone("+91 (11) 2345-6789").is_ok());
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone(&"1".repeat(MAX_PHONE_LENGTH + 1)).is_err());
    }

    #[test]
    fn position_range() {
        assert!(validate_position(&Position::new(90.0, -180.0)).is_ok());
        assert!(validate_position(&Position::new(90.1, 0.0)).is_err());
        assert!(validate_position(&Position::new(0.0, 180.5)).is_err());
    }

    #[test]
    fn image_extensions() {
        assert_eq!(image_extension("IMG_001.JPG").unwrap(), "jpg");
        assert!(image_extension("notes.txt").is_err());
        assert!(image_extension("noext").is_err());
    }

    #[test]
    fn coordinates_from_form_text() {
        assert_eq!(parse_coordinate("lat", " 28.6 ").unwrap(), Some(28.6));
        assert_eq!(parse_coordinate("lat", "").unwrap(), None);
        assert!(parse_coordinate("lng", "east").is_err());
        assert!(parse_coordinate("lng", "NaN").is_err());
    }

    #[test]
    fn idempotency_keys() {
        assert!(validate_idempotency_key("3f2b9c1e-7d1a-4b8e-9f00-1a2b3c4d5e6f").is_ok());
        assert!(validate_idempotency_key("").is_err());
        assert!(validate_idempotency_key("has space").is_err());
    }
}
