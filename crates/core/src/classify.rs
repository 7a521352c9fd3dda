//! Keyword-based severity classification for reports submitted without one.

use crate::report::Severity;

/// Words that mark a description as `Critical`.
pub const CRITICAL_KEYWORDS: &[&str] = &[
    "death",
    "fatal",
    "collapsed",
    "major",
    "catastrophic",
    "explosion",
];

/// Words that mark a description as `High` (checked after critical ones).
pub const HIGH_KEYWORDS: &[&str] = &[
    "injury",
    "damaged",
    "flood",
    "fire",
    "earthquake",
    "moderate",
];

/// Classify a free-text description. Substring match on the lower-cased
/// text; no keyword hit means `Low`.
pub fn classify_severity(description: &str) -> Severity {
    let text = description.to_lowercase();
    if CRITICAL_KEYWORDS.iter().any(|k| text.contains(k)) {
        Severity::Critical
    } else if HIGH_KEYWORDS.iter().any(|k| text.contains(k)) {
        Severity::High
    } else {
        Severity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_keywords_take_precedence() {
        assert_eq!(
            classify_severity("Fire after gas EXPLOSION, building collapsed"),
            Severity::Critical
        );
    }

    #[test]
    fn high_keywords() {
        assert_eq!(classify_severity("Flood water rising"), Severity::High);
        assert_eq!(classify_severity("one injury reported"), Severity::High);
    }

    #[test]
    fn no_keywords_is_low() {
        assert_eq!(classify_severity("Tree branch on the road"), Severity::Low);
        assert_eq!(classify_severity(""), Severity::Low);
    }
}
