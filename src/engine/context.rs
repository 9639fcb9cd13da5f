//! Shared collaborators for the scan engine.

use std::sync::Arc;

use crate::cache::ScanCache;
use crate::error_handling::PipelineStats;
use crate::lexical::FeatureExtractor;
use crate::notify::AlertQueue;
use crate::phishing::PhishingModel;
use crate::redirect::RedirectResolver;
use crate::reputation::ReputationLookup;
use crate::tls::CertificateProbe;

/// Everything an evaluation needs, constructed once at startup and shared
/// read-only across concurrent evaluations.
pub struct EngineContext {
    /// Redirect resolution
    pub resolver: RedirectResolver,
    /// Reputation service
    pub reputation: Arc<dyn ReputationLookup>,
    /// TLS certificate fetching
    pub certificates: Arc<dyn CertificateProbe>,
    /// Lexical and registration features
    pub features: FeatureExtractor,
    /// Phishing classifier
    pub model: Arc<dyn PhishingModel>,
    /// Verdict cache
    pub cache: Arc<dyn ScanCache>,
    /// Outbound alerts
    pub alerts: AlertQueue,
    /// Pipeline counters
    pub stats: Arc<PipelineStats>,
}

impl EngineContext {
    /// Creates a new `EngineContext` with the given collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: RedirectResolver,
        reputation: Arc<dyn ReputationLookup>,
        certificates: Arc<dyn CertificateProbe>,
        features: FeatureExtractor,
        model: Arc<dyn PhishingModel>,
        cache: Arc<dyn ScanCache>,
        alerts: AlertQueue,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            resolver,
            reputation,
            certificates,
            features,
            model,
            cache,
            alerts,
            stats,
        }
    }
}
