//! Application initialization and resource setup.
//!
//! Builds every process-wide collaborator once at startup (HTTP clients,
//! DNS resolver, reputation client, result cache, phishing model, alert
//! worker) and wires them into a [`ScanEngine`]. Configuration problems are
//! reported as `InitializationError` here rather than on the first request.

mod client;
mod logger;
mod resolver;

use std::sync::Arc;

use rustls::crypto::{ring::default_provider, CryptoProvider};
use tokio::task::JoinHandle;

pub use client::{init_client, init_redirect_client};
pub use logger::init_logger_with;
pub use resolver::init_resolver;

use crate::cache::{MemoryScanCache, ScanCache, SqliteScanCache};
use crate::config::Config;
use crate::dns::HickoryHostResolver;
use crate::domain::install_suffix_list;
use crate::engine::{EngineContext, ScanEngine};
use crate::error_handling::{InitializationError, PipelineStats};
use crate::lexical::FeatureExtractor;
use crate::notify::{AlertQueue, AlertSender, LogAlertSender, WebhookAlertSender};
use crate::phishing::{DisabledModel, LogisticModel, PhishingModel};
use crate::redirect::{tracer_for_mode, RedirectResolver, RedirectTracer};
use crate::reputation::VirusTotalClient;
use crate::tls::RustlsCertificateProbe;
use crate::whois::RdapClient;

/// Initializes the crypto provider for TLS operations.
///
/// Must run before any TLS connection is made.
pub fn init_crypto_provider() {
    // Installing twice is harmless; the second attempt just returns Err
    let _ = CryptoProvider::install_default(default_provider());
}

/// Shared resources produced by [`init_resources`].
pub struct AppResources {
    /// The verdict pipeline
    pub engine: ScanEngine,
    /// Tracer for standalone redirect analysis
    pub tracer: Arc<dyn RedirectTracer>,
    /// Worker draining the alert queue; finishes once every engine clone is
    /// dropped
    pub alert_worker: JoinHandle<()>,
}

async fn init_cache(config: &Config) -> Result<Arc<dyn ScanCache>, InitializationError> {
    match &config.cache_db {
        Some(path) => {
            log::info!("Using SQLite result cache at {}", path.display());
            Ok(Arc::new(SqliteScanCache::open(path).await?))
        }
        None => {
            log::info!("Using in-memory result cache");
            Ok(Arc::new(MemoryScanCache::new()))
        }
    }
}

fn init_model(config: &Config) -> Result<Arc<dyn PhishingModel>, InitializationError> {
    match &config.model_path {
        Some(path) => {
            let model = LogisticModel::from_path(path)?;
            log::info!("Loaded phishing model from {}", path.display());
            Ok(Arc::new(model))
        }
        None => {
            log::info!("No phishing model configured, model signal disabled");
            Ok(Arc::new(DisabledModel))
        }
    }
}

fn init_alert_sender(config: &Config, client: &reqwest::Client) -> Arc<dyn AlertSender> {
    match &config.alert_webhook {
        Some(endpoint) => Arc::new(WebhookAlertSender::new(client.clone(), endpoint.clone())),
        None => Arc::new(LogAlertSender),
    }
}

/// Builds every collaborator from `config`.
///
/// # Errors
///
/// Returns `InitializationError::MissingApiKey` when no reputation credential
/// is configured, and other variants when an HTTP client, the suffix list, the
/// model, or the cache database cannot be set up.
pub async fn init_resources(config: &Config) -> Result<AppResources, InitializationError> {
    let api_key = config
        .reputation_api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(InitializationError::MissingApiKey)?;

    init_crypto_provider();

    if let Some(path) = &config.suffix_list {
        install_suffix_list(path)
            .map_err(|e| InitializationError::SuffixListError(format!("{e:#}")))?;
        log::info!("Installed public suffix list from {}", path.display());
    }

    let client = init_client(config)?;
    let redirect_client = init_redirect_client(config)?;
    let stats = Arc::new(PipelineStats::new());

    let tracer = tracer_for_mode(config.trace_mode, redirect_client);
    log::info!("Redirect tracing mode: {:?}", config.trace_mode);

    let reputation = VirusTotalClient::new(client.clone(), api_key)
        .with_base_url(config.reputation_base_url.clone());

    let mut rdap = RdapClient::new(client.clone(), config.rdap_base_url.clone());
    if let Some(dir) = &config.whois_cache_dir {
        rdap = rdap.with_cache_dir(dir.clone());
    }
    let features = FeatureExtractor::new(
        Arc::new(rdap),
        Arc::new(HickoryHostResolver::new(init_resolver())),
    );

    let (alerts, alert_worker) =
        AlertQueue::spawn(init_alert_sender(config, &client), stats.clone());

    let ctx = EngineContext::new(
        RedirectResolver::new(tracer.clone()),
        Arc::new(reputation),
        Arc::new(RustlsCertificateProbe::new()),
        features,
        init_model(config)?,
        init_cache(config).await?,
        alerts,
        stats,
    );

    Ok(AppResources {
        engine: ScanEngine::new(ctx),
        tracer,
        alert_worker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_fatal() {
        let result = init_resources(&Config::default()).await;
        assert!(matches!(result, Err(InitializationError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_blank_api_key_is_fatal() {
        let config = Config {
            reputation_api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            init_resources(&config).await,
            Err(InitializationError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_bad_model_path_is_fatal() {
        let config = Config {
            reputation_api_key: Some("key".to_string()),
            model_path: Some("/nonexistent/model.json".into()),
            ..Default::default()
        };
        assert!(matches!(
            init_resources(&config).await,
            Err(InitializationError::ModelError(_))
        ));
    }

    #[tokio::test]
    async fn test_builds_with_sqlite_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            reputation_api_key: Some("key".to_string()),
            cache_db: Some(dir.path().join("cache.db")),
            ..Default::default()
        };
        let resources = init_resources(&config).await.unwrap();
        assert_eq!(resources.engine.context().stats.evaluations(), 0);
    }
}
