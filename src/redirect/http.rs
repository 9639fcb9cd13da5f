//! HTTP-level redirect tracing.
//!
//! Follows `Location` headers manually with a redirect-disabled client so that
//! every intermediate hop is recorded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::chain::{PushOutcome, RedirectChain};
use super::{RedirectTracer, Trace};
use crate::config::{MAX_REDIRECT_HOPS, REDIRECT_TIMEOUT};
use crate::error_handling::TraceError;

/// Returns true for the status codes we follow (301, 302, 303, 307, 308).
pub(crate) fn is_redirect_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Resolves a `Location` value against the URL that returned it.
pub(crate) fn resolve_location(current: &str, location: &str) -> Result<String, TraceError> {
    Url::parse(location)
        .or_else(|_| Url::parse(current).and_then(|base| base.join(location)))
        .map(|u| u.to_string())
        .map_err(|e| TraceError::InvalidUrl(format!("{location}: {e}")))
}

/// Result of one hop: where to go next, if anywhere.
pub(crate) enum HopOutcome {
    /// The server redirected to this URL.
    Redirect(String),
    /// The response was terminal.
    Landed(reqwest::Response),
}

/// Issues one GET and classifies the response.
pub(crate) async fn fetch_hop(
    client: &reqwest::Client,
    current: &str,
) -> Result<HopOutcome, TraceError> {
    let resp = client.get(current).send().await?;
    let status = resp.status();

    if is_redirect_status(status) {
        if let Some(loc) = resp.headers().get(reqwest::header::LOCATION) {
            let loc = loc.to_str().unwrap_or("");
            return Ok(HopOutcome::Redirect(resolve_location(current, loc)?));
        }
        // Redirect status but no Location header - unusual, treat as landed
        log::warn!(
            "Redirect status {} for {} but no Location header",
            status.as_u16(),
            current
        );
    }
    Ok(HopOutcome::Landed(resp))
}

/// Traces server-side (3xx) redirects only.
///
/// The client passed in must have automatic redirects disabled, otherwise
/// intermediate hops are invisible.
#[derive(Debug, Clone)]
pub struct HttpRedirectTracer {
    client: reqwest::Client,
    max_hops: usize,
    timeout: Duration,
}

impl HttpRedirectTracer {
    /// Creates a tracer with the default hop limit and timeout.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_hops: MAX_REDIRECT_HOPS,
            timeout: REDIRECT_TIMEOUT,
        }
    }

    /// Overrides the maximum number of redirects followed.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Overrides the overall deadline for one trace.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn follow(&self, start_url: &str) -> Result<Trace, TraceError> {
        let mut chain = RedirectChain::new(start_url);
        let mut current = start_url.to_string();
        let mut redirects = 0usize;

        loop {
            match fetch_hop(&self.client, &current).await? {
                HopOutcome::Landed(_) => {
                    return Ok(Trace {
                        chain,
                        revisit: None,
                    })
                }
                HopOutcome::Redirect(next) => {
                    redirects += 1;
                    if redirects > self.max_hops {
                        return Err(TraceError::TooManyRedirects(self.max_hops));
                    }
                    log::debug!("Redirect {} -> {}", current, next);
                    if chain.push(next.clone()) == PushOutcome::Revisit {
                        log::debug!("Redirect loop at {} while tracing {}", next, start_url);
                        return Ok(Trace {
                            chain,
                            revisit: Some(next),
                        });
                    }
                    current = next;
                }
            }
        }
    }
}

#[async_trait]
impl RedirectTracer for HttpRedirectTracer {
    async fn trace(&self, url: &str) -> Result<Trace, TraceError> {
        tokio::time::timeout(self.timeout, self.follow(url))
            .await
            .map_err(|_| TraceError::Timeout)?
    }
}
