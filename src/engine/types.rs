//! Verdict request and response types.

use serde::{Deserialize, Serialize};

use crate::error_handling::{SignalType, VerdictError};
use crate::homograph::HomographReport;
use crate::lexical::LexicalReport;
use crate::models::Classification;
use crate::phishing::Prediction;
use crate::redirect::ChainVerdict;
use crate::reputation::ReputationScan;
use crate::tls::HttpsReport;

/// Verdict request. Both fields are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerdictRequest {
    /// URL to classify
    #[serde(default)]
    pub url: Option<String>,
    /// Address alerted when the URL is not safe
    #[serde(default)]
    pub email: Option<String>,
}

impl VerdictRequest {
    /// Builds a request from both fields.
    pub fn new(url: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            email: Some(email.into()),
        }
    }

    /// Returns trimmed `(url, email)`.
    ///
    /// # Errors
    ///
    /// Returns `VerdictError::InvalidInput` when either is missing or blank.
    pub fn validate(&self) -> Result<(&str, &str), VerdictError> {
        let url = self.url.as_deref().map(str::trim).unwrap_or_default();
        let email = self.email.as_deref().map(str::trim).unwrap_or_default();
        if url.is_empty() || email.is_empty() {
            return Err(VerdictError::InvalidInput("Missing URL or Email".to_string()));
        }
        Ok((url, email))
    }
}

/// Verdict for one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictResponse {
    /// Final classification
    pub classification: Classification,
    /// Human-readable reason
    pub reason: String,
    /// Supporting details
    pub details: VerdictDetails,
}

/// Supporting details of a verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictDetails {
    /// Cumulative score; absent for cached verdicts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Whether the URL redirected elsewhere
    pub is_shortened: bool,
    /// Final destination
    pub expanded_url: String,
    /// Per-stage evidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<VerdictExtra>,
}

/// Per-stage evidence attached to a verdict. Stages that did not run are
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictExtra {
    /// Served from the result cache
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
    /// Homograph characters found, in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspicious_characters: Option<HomographReport>,
    /// Visited URLs when the URL redirected
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub redirect_chain: Vec<String>,
    /// Chain heuristics verdict for multi-hop chains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_verdict: Option<ChainVerdict>,
    /// Reputation engine counts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation: Option<ReputationScan>,
    /// HTTPS and certificate check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https: Option<HttpsReport>,
    /// Lexical and registration analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexical: Option<LexicalReport>,
    /// Phishing model output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phishing_model: Option<Prediction>,
    /// Sub-checks that fell back to neutral values
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}

impl VerdictExtra {
    pub(crate) fn note_degraded(&mut self, signal: SignalType) {
        let name = signal.as_str().to_string();
        if !self.degraded.contains(&name) {
            self.degraded.push(name);
        }
    }
}

/// Running risk score for one evaluation. Only ever increases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskScore {
    total: u32,
    reasons: Vec<String>,
}

impl RiskScore {
    /// Adds `points` and records why.
    pub fn add(&mut self, points: u32, reason: impl Into<String>) {
        self.total = self.total.saturating_add(points);
        self.reasons.push(reason.into());
    }

    /// Current total.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Classification of the current total.
    pub fn classification(&self) -> Classification {
        Classification::from_score(self.total)
    }

    /// Reasons joined in the order they fired, or a default when none did.
    pub fn reason(&self) -> String {
        if self.reasons.is_empty() {
            NO_RISK_REASON.to_string()
        } else {
            self.reasons.join("; ")
        }
    }
}

/// Reason given when no rule fired.
pub const NO_RISK_REASON: &str = "No risk indicators found";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_both_fields() {
        assert!(VerdictRequest::new("http://a.test", "u@a.test").validate().is_ok());
        assert_eq!(
            VerdictRequest::new("  ", "u@a.test").validate(),
            Err(VerdictError::InvalidInput("Missing URL or Email".into()))
        );
        let missing_email = VerdictRequest {
            url: Some("http://a.test".into()),
            email: None,
        };
        assert!(missing_email.validate().is_err());
    }

    #[test]
    fn test_validate_trims() {
        let request = VerdictRequest::new("  http://a.test  ", " u@a.test ");
        assert_eq!(request.validate().unwrap(), ("http://a.test", "u@a.test"));
    }

    #[test]
    fn test_risk_score_accumulates() {
        let mut score = RiskScore::default();
        assert_eq!(score.reason(), NO_RISK_REASON);
        assert_eq!(score.classification(), Classification::Safe);

        score.add(10, "Suspicious redirect chain");
        score.add(50, "URL does not use HTTPS");
        assert_eq!(score.total(), 60);
        assert_eq!(score.classification(), Classification::Suspicious);
        assert_eq!(score.reason(), "Suspicious redirect chain; URL does not use HTTPS");
    }

    #[test]
    fn test_risk_score_saturates() {
        let mut score = RiskScore::default();
        score.add(u32::MAX, "a");
        score.add(5, "b");
        assert_eq!(score.total(), u32::MAX);
    }

    #[test]
    fn test_details_omit_absent_fields() {
        let details = VerdictDetails {
            score: None,
            is_shortened: false,
            expanded_url: "http://a.test".into(),
            extra: Some(VerdictExtra {
                cached: true,
                ..Default::default()
            }),
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "isShortened": false,
                "expandedUrl": "http://a.test",
                "extra": {"cached": true}
            })
        );
    }
}
