//! Point-weighted lexical rule table.

use serde::Serialize;

use super::features::{FeatureVector, UNKNOWN_DAYS};
use crate::config::{LEXICAL_SAFE_MAX, LEXICAL_SUSPICIOUS_MAX};

const RISKY_REGISTRARS: &[&str] = &["tencent cloud", "namecheap", "freenom", "bizcn"];
const HIGH_RISK_COUNTRIES: &[&str] = &["RU", "CN", "IR", "KP", "SY"];

/// Lexical sub-classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LexicalClass {
    /// Score of 30 or less
    Safe,
    /// Score of 31 to 60
    Suspicious,
    /// Score above 60
    #[serde(rename = "Likely Malicious")]
    LikelyMalicious,
}

impl LexicalClass {
    /// Classifies a rule-table score.
    pub fn from_score(score: u32) -> Self {
        if score <= LEXICAL_SAFE_MAX {
            LexicalClass::Safe
        } else if score <= LEXICAL_SUSPICIOUS_MAX {
            LexicalClass::Suspicious
        } else {
            LexicalClass::LikelyMalicious
        }
    }

    /// Whether the class is anything but `Safe`.
    pub fn is_risky(&self) -> bool {
        !matches!(self, LexicalClass::Safe)
    }
}

/// Runs the feature vector through the rule table. Each rule is additive.
pub fn score_features(f: &FeatureVector) -> u32 {
    let mut score = 0;

    if f.url_length > 75 {
        score += 5;
    }
    if f.count_at > 0 || f.count_equals > 2 || f.count_ampersands > 3 {
        score += 10;
    }
    if f.has_ip {
        score += 20;
    }
    if f.suspicious_tld {
        score += 15;
    }
    if f.entropy > 4.2 {
        score += 10;
    }
    if !f.is_https {
        score += 5;
    }
    if f.has_port_in_url {
        score += 5;
    }
    if f.is_encoded {
        score += 5;
    }

    if f.domain_age_days == UNKNOWN_DAYS {
        score += 5;
    } else if f.domain_age_days < 180 {
        score += 10;
    }
    if f.domain_expiration_days != UNKNOWN_DAYS && f.domain_expiration_days < 30 {
        score += 5;
    }
    if (0..30).contains(&f.domain_last_updated_days) {
        score += 3;
    }

    let registrar = f.registrar.to_lowercase();
    if RISKY_REGISTRARS.iter().any(|r| registrar.contains(r)) {
        score += 5;
    }
    if HIGH_RISK_COUNTRIES.contains(&f.country.to_uppercase().as_str()) {
        score += 5;
    }
    if !f.whois_success {
        score += 5;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::features::{extract_lexical, RegistrationFeatures};

    fn established() -> RegistrationFeatures {
        RegistrationFeatures {
            domain_age_days: 5000,
            domain_creation_date: "2012-04-01".into(),
            domain_expiration_days: 400,
            domain_last_updated_days: 200,
            registrar: "MarkMonitor Inc.".into(),
            country: "US".into(),
            whois_success: true,
        }
    }

    fn vector(url: &str, reg: RegistrationFeatures) -> FeatureVector {
        FeatureVector::assemble(&extract_lexical(url), None, reg)
    }

    #[test]
    fn test_class_boundaries() {
        assert_eq!(LexicalClass::from_score(0), LexicalClass::Safe);
        assert_eq!(LexicalClass::from_score(30), LexicalClass::Safe);
        assert_eq!(LexicalClass::from_score(31), LexicalClass::Suspicious);
        assert_eq!(LexicalClass::from_score(60), LexicalClass::Suspicious);
        assert_eq!(LexicalClass::from_score(61), LexicalClass::LikelyMalicious);
        assert!(!LexicalClass::Safe.is_risky());
        assert!(LexicalClass::Suspicious.is_risky());
        assert!(LexicalClass::LikelyMalicious.is_risky());
    }

    #[test]
    fn test_class_serialization() {
        assert_eq!(
            serde_json::to_string(&LexicalClass::LikelyMalicious).unwrap(),
            "\"Likely Malicious\""
        );
    }

    #[test]
    fn test_clean_established_https_scores_zero() {
        assert_eq!(score_features(&vector("https://example.com/", established())), 0);
    }

    #[test]
    fn test_whois_failure_scores_ten() {
        // unknown age +5, lookup failed +5
        let score = score_features(&vector("https://example.com/", RegistrationFeatures::unavailable()));
        assert_eq!(score, 10);
    }

    #[test]
    fn test_each_rule_contributes() {
        let base = score_features(&vector("https://example.com/", established()));

        let ip = score_features(&vector("https://10.0.0.1/", established()));
        assert_eq!(ip - base, 20);

        let tld = score_features(&vector("https://example.tk/", established()));
        assert_eq!(tld - base, 15);

        let http = score_features(&vector("http://example.com/", established()));
        assert_eq!(http - base, 5);

        let at = score_features(&vector("https://example.com/@x", established()));
        assert_eq!(at - base, 10);

        let port = score_features(&vector("https://example.com:8080/", established()));
        assert_eq!(port - base, 5);
    }

    #[test]
    fn test_registration_rules() {
        let mut reg = established();
        reg.domain_age_days = 10;
        reg.domain_expiration_days = 5;
        reg.domain_last_updated_days = 0;
        reg.registrar = "NameCheap, Inc.".into();
        reg.country = "ru".into();
        // young +10, expiring +5, updated +3, registrar +5, country +5
        assert_eq!(score_features(&vector("https://example.com/", reg)), 28);
    }

    #[test]
    fn test_adding_trigger_never_decreases_score() {
        let clean = score_features(&vector("https://example.com/", established()));
        let with_ip = score_features(&vector("https://1.2.3.4/", established()));
        assert!(with_ip >= clean);
    }
}
