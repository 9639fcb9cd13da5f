//! Shared verdict types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::config::{MALICIOUS_THRESHOLD, SUSPICIOUS_THRESHOLD};

/// Final classification of a URL.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Classification {
    /// No risk indicators crossed a threshold.
    Safe,
    /// Enough indicators to warn the user.
    Suspicious,
    /// High-confidence risk.
    Malicious,
}

impl Classification {
    /// Maps a cumulative risk score onto a classification.
    ///
    /// `>= 70` is malicious, `>= 50` suspicious, anything lower safe.
    pub fn from_score(score: u32) -> Self {
        if score >= MALICIOUS_THRESHOLD {
            Classification::Malicious
        } else if score >= SUSPICIOUS_THRESHOLD {
            Classification::Suspicious
        } else {
            Classification::Safe
        }
    }

    /// Whether this verdict should trigger an alert.
    pub fn is_alerting(&self) -> bool {
        !matches!(self, Classification::Safe)
    }
}

/// Cached verdict for one URL.
///
/// Created once per distinct URL on its first full evaluation and served for
/// every later lookup of the same URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Normalized original URL (the cache key)
    pub url: String,
    /// Final classification
    pub classification: Classification,
    /// Human-readable reason
    pub reason: String,
    /// When the verdict was first produced
    pub created_at: DateTime<Utc>,
}

impl ScanResult {
    /// Creates a new record stamped with the current time.
    pub fn new(url: impl Into<String>, classification: Classification, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            classification,
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_from_score_thresholds() {
        assert_eq!(Classification::from_score(0), Classification::Safe);
        assert_eq!(Classification::from_score(49), Classification::Safe);
        assert_eq!(Classification::from_score(50), Classification::Suspicious);
        assert_eq!(Classification::from_score(69), Classification::Suspicious);
        assert_eq!(Classification::from_score(70), Classification::Malicious);
        assert_eq!(Classification::from_score(200), Classification::Malicious);
    }

    #[test]
    fn test_classification_string_forms() {
        assert_eq!(Classification::Suspicious.to_string(), "suspicious");
        assert_eq!(
            Classification::from_str("malicious").unwrap(),
            Classification::Malicious
        );
        assert_eq!(
            serde_json::to_string(&Classification::Safe).unwrap(),
            "\"safe\""
        );
    }

    #[test]
    fn test_is_alerting() {
        assert!(!Classification::Safe.is_alerting());
        assert!(Classification::Suspicious.is_alerting());
        assert!(Classification::Malicious.is_alerting());
    }
}
