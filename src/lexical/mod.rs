//! Lexical and registration feature extraction.
//!
//! Computes string-structure metrics for a URL, resolves its host, looks up
//! registration metadata for its registrable domain, and scores the result
//! with a fixed point-weighted rule table. DNS and registration failures
//! degrade to sentinel values; extraction itself never fails.

mod features;
mod scoring;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

pub use features::{
    extract_lexical, shannon_entropy, FeatureVector, LexicalFeatures, RegistrationFeatures,
    SUSPICIOUS_TLDS, UNAVAILABLE, UNKNOWN_DAYS,
};
pub use scoring::{score_features, LexicalClass};

use crate::dns::HostResolver;
use crate::domain::extract_domain;
use crate::error_handling::SignalType;
use crate::whois::RegistrationLookup;

/// Scored lexical analysis of one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexicalReport {
    /// Extracted features
    pub features: FeatureVector,
    /// Rule-table score
    pub score: u32,
    /// Sub-classification of `score`
    pub classification: LexicalClass,
    /// Sub-checks that fell back to sentinels
    #[serde(skip)]
    pub degraded: Vec<SignalType>,
}

/// Builds feature vectors using injected DNS and registration collaborators.
#[derive(Clone)]
pub struct FeatureExtractor {
    registration: Arc<dyn RegistrationLookup>,
    resolver: Arc<dyn HostResolver>,
}

impl FeatureExtractor {
    /// Creates an extractor.
    pub fn new(registration: Arc<dyn RegistrationLookup>, resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            registration,
            resolver,
        }
    }

    async fn registration_features(&self, url: &str, host: &str) -> Option<RegistrationFeatures> {
        if host.is_empty() {
            return None;
        }
        let domain = match extract_domain(url) {
            Ok(domain) => domain,
            Err(e) => {
                log::debug!("No registrable domain for {}: {}", url, e);
                return None;
            }
        };
        match self.registration.lookup(&domain).await {
            Ok(record) => Some(RegistrationFeatures::from_record(&record, Utc::now())),
            Err(e) => {
                log::warn!("Registration lookup failed for {}: {:#}", domain, e);
                None
            }
        }
    }

    async fn resolved_ip(&self, host: &str) -> Option<String> {
        if host.is_empty() {
            return None;
        }
        match self.resolver.resolve(host).await {
            Ok(ip) => Some(ip.to_string()),
            Err(e) => {
                log::warn!("DNS resolution failed for {}: {}", host, e);
                None
            }
        }
    }

    /// Extracts and scores features for `url`.
    ///
    /// Registration and DNS lookups run concurrently, each under its own
    /// deadline.
    pub async fn analyze(&self, url: &str) -> LexicalReport {
        let lexical = extract_lexical(url);
        let (registration, resolved_ip) = tokio::join!(
            self.registration_features(url, &lexical.host),
            self.resolved_ip(&lexical.host)
        );

        let mut degraded = Vec::new();
        if registration.is_none() {
            degraded.push(SignalType::Registration);
        }
        if resolved_ip.is_none() {
            degraded.push(SignalType::Dns);
        }

        let features = FeatureVector::assemble(
            &lexical,
            resolved_ip,
            registration.unwrap_or_else(RegistrationFeatures::unavailable),
        );
        let score = score_features(&features);
        let classification = LexicalClass::from_score(score);
        log::debug!("Lexical score for {}: {} ({:?})", url, score, classification);

        LexicalReport {
            features,
            score,
            classification,
            degraded,
        }
    }
}
