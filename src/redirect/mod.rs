//! Redirect resolution and chain analysis.
//!
//! This module provides:
//! - `RedirectTracer`, the capability of following a URL to its destination,
//!   with an HTTP-only and a client-side-aware implementation
//! - `RedirectResolver`, which never fails and reports shortening
//! - `evaluate_chain`, heuristics over a resolved chain
//! - `analyze_redirects`, the standalone redirect-analysis entry point

mod chain;
mod heuristics;
mod http;
mod rendered;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub use chain::{PushOutcome, RedirectChain};
pub use heuristics::{
    evaluate_chain, ChainStatus, ChainVerdict, KNOWN_CLOAKERS, LOOP_ISSUE,
    TRUSTED_DESTINATION_REASON, TRUSTED_FINAL_DOMAINS,
};
pub use http::HttpRedirectTracer;
pub use rendered::{find_client_redirect, RenderedRedirectTracer};

use crate::config::TraceMode;
use crate::error_handling::{TraceError, VerdictError};
use crate::url_record::UrlRecord;

/// Outcome of tracing one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    /// Visited URLs, start first
    pub chain: RedirectChain,
    /// Set when a redirect pointed back to an already visited URL
    pub revisit: Option<String>,
}

impl Trace {
    /// A trace that did not move.
    pub fn unchanged(url: &str) -> Self {
        Self {
            chain: RedirectChain::new(url),
            revisit: None,
        }
    }

    /// The last URL reached.
    pub fn final_url(&self) -> &str {
        self.chain.last()
    }

    /// Hops for heuristics, with the revisited URL appended so loops show up
    /// as a duplicate.
    pub fn hops_for_analysis(&self) -> Vec<String> {
        let mut hops = self.chain.as_slice().to_vec();
        if let Some(revisit) = &self.revisit {
            hops.push(revisit.clone());
        }
        hops
    }
}

/// Follows a URL through redirects.
#[async_trait]
pub trait RedirectTracer: Send + Sync {
    /// Traces `url` to its final destination.
    ///
    /// # Errors
    ///
    /// Returns a `TraceError` when the URL is unreachable, the trace exceeds
    /// its deadline, or the redirect limit is exceeded.
    async fn trace(&self, url: &str) -> Result<Trace, TraceError>;
}

/// Builds the tracer selected by configuration.
pub fn tracer_for_mode(mode: TraceMode, client: reqwest::Client) -> Arc<dyn RedirectTracer> {
    match mode {
        TraceMode::Http => Arc::new(HttpRedirectTracer::new(client)),
        TraceMode::Rendered => Arc::new(RenderedRedirectTracer::new(client)),
    }
}

/// Result of resolving a possibly shortened URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Whether the destination differs from the input
    pub is_shortened: bool,
    /// Final destination (the input itself on failure)
    pub final_url: String,
    /// Visited URLs, including the revisit of a loop if one occurred
    pub chain: Vec<String>,
    /// Set when the trace failed and the input was returned unchanged
    pub degraded: bool,
}

/// Resolves URLs through a tracer, absorbing every failure.
#[derive(Clone)]
pub struct RedirectResolver {
    tracer: Arc<dyn RedirectTracer>,
}

impl RedirectResolver {
    /// Wraps a tracer.
    pub fn new(tracer: Arc<dyn RedirectTracer>) -> Self {
        Self { tracer }
    }

    /// Resolves a URL to its final destination.
    ///
    /// Network failures return the URL unchanged with `is_shortened = false`;
    /// a failed trace is evidence of nothing.
    ///
    /// # Errors
    ///
    /// Returns `VerdictError::InvalidInput` for empty input.
    pub async fn resolve(&self, raw: &str) -> Result<Resolution, VerdictError> {
        let record = UrlRecord::parse(raw)?;
        let url = record.as_str();

        match self.tracer.trace(url).await {
            Ok(trace) => {
                let final_url = trace.final_url().to_string();
                Ok(Resolution {
                    is_shortened: final_url != url,
                    final_url,
                    chain: trace.hops_for_analysis(),
                    degraded: false,
                })
            }
            Err(e) => {
                log::warn!("Redirect trace failed for {}: {}", url, e);
                Ok(Resolution {
                    is_shortened: false,
                    final_url: url.to_string(),
                    chain: vec![url.to_string()],
                    degraded: true,
                })
            }
        }
    }
}

/// Response of the redirect-analysis entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RedirectReport {
    /// The chain was traced and evaluated.
    #[serde(rename_all = "camelCase")]
    Analyzed {
        /// Normalized input URL
        original_url: String,
        /// Final destination
        final_url: String,
        /// Visited URLs in order
        redirect_chain: Vec<String>,
        /// Whether chain heuristics flagged the chain
        is_suspicious: bool,
        /// Chain issues, or the trust reason
        reason: Vec<String>,
    },
    /// The chain could not be traced.
    Failed {
        /// Human-readable failure
        error: String,
    },
}

/// Traces a URL and evaluates its chain.
///
/// Unlike [`RedirectResolver::resolve`], trace failures are reported to the
/// caller as `RedirectReport::Failed`.
///
/// # Errors
///
/// Returns `VerdictError::InvalidInput` for empty or malformed input.
pub async fn analyze_redirects(
    tracer: &dyn RedirectTracer,
    raw: &str,
) -> Result<RedirectReport, VerdictError> {
    let record = UrlRecord::parse(raw)?;
    let original_url = record.into_string();

    let trace = match tracer.trace(&original_url).await {
        Ok(trace) => trace,
        Err(e) => {
            log::info!("Redirect analysis failed for {}: {}", original_url, e);
            return Ok(RedirectReport::Failed {
                error: e.to_string(),
            });
        }
    };

    let hops = trace.hops_for_analysis();
    let verdict = evaluate_chain(&hops);
    log::debug!(
        "Redirect analysis for {}: {} hop(s), {:?}",
        original_url,
        hops.len(),
        verdict.status
    );

    Ok(RedirectReport::Analyzed {
        final_url: trace.final_url().to_string(),
        original_url,
        redirect_chain: hops,
        is_suspicious: verdict.is_suspicious(),
        reason: verdict.issues,
    })
}
