//! Domain registration lookup over RDAP.
//!
//! Registration data is best-effort: every failure surfaces as an error to the
//! caller, which substitutes sentinel values. Successful lookups can be cached
//! on disk for seven days.

mod cache;
mod parse;
mod types;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

pub use types::RegistrationRecord;

use crate::config::WHOIS_TIMEOUT_SECS;
use cache::{load_from_cache, save_to_cache};
use parse::convert_rdap;
use types::RdapDomain;

/// Looks up registration metadata for a registrable domain.
#[async_trait]
pub trait RegistrationLookup: Send + Sync {
    /// Fetches the registration record for `domain` (e.g. "example.com").
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, transport failure, missing record, or an
    /// unparseable response.
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord>;
}

/// RDAP client with an optional disk cache.
#[derive(Debug, Clone)]
pub struct RdapClient {
    client: reqwest::Client,
    base_url: String,
    cache_dir: Option<PathBuf>,
    timeout: Duration,
}

impl RdapClient {
    /// Creates a client against `base_url` (e.g. "https://rdap.org").
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache_dir: None,
            timeout: Duration::from_secs(WHOIS_TIMEOUT_SECS),
        }
    }

    /// Enables the on-disk cache under `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Overrides the per-lookup timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch(&self, domain: &str) -> Result<RegistrationRecord> {
        let url = format!("{}/domain/{}", self.base_url, domain);
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/rdap+json, application/json")
            .send()
            .await
            .with_context(|| format!("RDAP request failed for {domain}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("RDAP returned HTTP {} for {}", status.as_u16(), domain);
        }

        let body: RdapDomain = resp
            .json()
            .await
            .with_context(|| format!("Failed to decode RDAP response for {domain}"))?;
        Ok(convert_rdap(&body))
    }
}

#[async_trait]
impl RegistrationLookup for RdapClient {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord> {
        let domain = domain.trim_end_matches('.').to_lowercase();

        if let Some(dir) = &self.cache_dir {
            match load_from_cache(dir, &domain) {
                Ok(Some(record)) => {
                    log::debug!("Registration cache hit for {}", domain);
                    return Ok(record);
                }
                Ok(None) => {}
                Err(e) => log::debug!("Registration cache unreadable for {}: {}", domain, e),
            }
        }

        log::debug!("Starting RDAP lookup for domain: {}", domain);
        let record = tokio::time::timeout(self.timeout, self.fetch(&domain))
            .await
            .map_err(|_| anyhow::anyhow!("RDAP lookup timed out for {domain}"))??;

        if let Some(dir) = &self.cache_dir {
            if let Err(e) = save_to_cache(dir, &domain, &record) {
                log::warn!("Failed to cache registration data for {}: {}", domain, e);
            }
        }

        Ok(record)
    }
}
