//! Host resolution.
//!
//! Best-effort forward lookups via `hickory-resolver`. Failures are reported
//! to the caller, which records a null address rather than failing.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Error, Result};
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;

use crate::config::DNS_TIMEOUT_SECS;

/// Resolves hostnames to addresses.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Returns the first address for `host`.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, NXDOMAIN, or an empty answer.
    async fn resolve(&self, host: &str) -> Result<IpAddr>;
}

/// Resolver backed by hickory with a hard deadline per lookup.
#[derive(Clone)]
pub struct HickoryHostResolver {
    resolver: Arc<TokioAsyncResolver>,
    timeout: Duration,
}

impl HickoryHostResolver {
    /// Wraps a shared resolver.
    pub fn new(resolver: Arc<TokioAsyncResolver>) -> Self {
        Self {
            resolver,
            timeout: Duration::from_secs(DNS_TIMEOUT_SECS),
        }
    }
}

#[async_trait]
impl HostResolver for HickoryHostResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr> {
        if let Ok(ip) = host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
            return Ok(ip);
        }

        let response = tokio::time::timeout(self.timeout, self.resolver.lookup_ip(host))
            .await
            .map_err(|_| Error::msg(format!("DNS lookup timed out for {host}")))?
            .map_err(Error::new)?;
        response
            .iter()
            .next()
            .ok_or_else(|| Error::msg("No IP addresses found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::config::{ResolverConfig, ResolverOpts};

    #[tokio::test]
    async fn test_ip_literal_skips_lookup() {
        let resolver = HickoryHostResolver::new(Arc::new(TokioAsyncResolver::tokio(
            ResolverConfig::default(),
            ResolverOpts::default(),
        )));
        assert_eq!(
            resolver.resolve("192.0.2.7").await.unwrap(),
            "192.0.2.7".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            resolver.resolve("[::1]").await.unwrap(),
            "::1".parse::<IpAddr>().unwrap()
        );
    }
}
