//! Multi-engine URL reputation lookup.
//!
//! Cache-first: the service's stored result for a URL is fetched by a stable
//! identifier (URL-safe base64 of the SHA-256 of the URL, unpadded). On a miss
//! the URL is submitted for analysis and the analysis is polled at a fixed
//! interval for a bounded number of attempts. The whole lookup runs under one
//! wall-clock deadline. Every failure, including a poll budget or deadline
//! that runs out, yields zero-valued stats.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::config::{
    DEFAULT_REPUTATION_BASE_URL, REPUTATION_DEADLINE, REPUTATION_MAX_POLLS,
    REPUTATION_POLL_INTERVAL, REPUTATION_REQUEST_TIMEOUT,
};
use crate::error_handling::{ReputationError, SignalType};

/// Engine verdict counts for one URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationStats {
    /// Engines reporting malicious
    #[serde(default)]
    pub malicious: u32,
    /// Engines reporting suspicious
    #[serde(default)]
    pub suspicious: u32,
    /// Engines reporting harmless
    #[serde(default)]
    pub harmless: u32,
    /// Engines with no detection
    #[serde(default)]
    pub undetected: u32,
}

/// Where a set of stats came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReputationSource {
    /// Stored result for the URL identifier
    Cached,
    /// Fresh analysis that reached `completed`
    Analysis,
    /// Analysis did not complete within the poll budget or deadline
    TimedOut,
    /// The service failed; stats are zero
    Unavailable,
    /// The surrounding evaluation was cancelled
    Cancelled,
}

/// Stats plus provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReputationScan {
    /// Engine counts (zero unless `source` is `Cached` or `Analysis`)
    pub stats: ReputationStats,
    /// Provenance of `stats`
    pub source: ReputationSource,
}

impl ReputationScan {
    fn zero(source: ReputationSource) -> Self {
        Self {
            stats: ReputationStats::default(),
            source,
        }
    }

    /// The degraded signal this scan represents, if any.
    pub fn degraded_signal(&self) -> Option<SignalType> {
        match self.source {
            ReputationSource::TimedOut => Some(SignalType::ReputationTimeout),
            ReputationSource::Unavailable => Some(SignalType::Reputation),
            _ => None,
        }
    }
}

/// Reputation lookup capability.
#[async_trait]
pub trait ReputationLookup: Send + Sync {
    /// Returns engine counts for `url`. Never fails: errors produce zeros.
    ///
    /// Polling stops early when `cancel` fires.
    async fn scan(&self, url: &str, cancel: &CancellationToken) -> ReputationScan;
}

/// Stable identifier for a URL: URL-safe base64 of its SHA-256, unpadded.
pub fn url_id(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(url.as_bytes()))
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct UrlObject {
    attributes: UrlAttributes,
}

#[derive(Deserialize)]
struct UrlAttributes {
    last_analysis_stats: ReputationStats,
}

#[derive(Deserialize)]
struct Submission {
    id: String,
}

#[derive(Deserialize)]
struct AnalysisObject {
    attributes: AnalysisAttributes,
}

#[derive(Deserialize)]
struct AnalysisAttributes {
    status: String,
    #[serde(default)]
    stats: ReputationStats,
}

/// Client for the VirusTotal v3 API.
#[derive(Debug, Clone)]
pub struct VirusTotalClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: usize,
    deadline: Duration,
}

impl VirusTotalClient {
    /// Creates a client with the default endpoint and poll cadence.
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_REPUTATION_BASE_URL.to_string(),
            api_key: api_key.into(),
            poll_interval: REPUTATION_POLL_INTERVAL,
            max_polls: REPUTATION_MAX_POLLS,
            deadline: REPUTATION_DEADLINE,
        }
    }

    /// Overrides the API base URL (e.g. a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the poll interval and attempt budget.
    pub fn with_polling(mut self, interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// Overrides the wall-clock budget for one lookup.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("x-apikey", &self.api_key)
            .timeout(REPUTATION_REQUEST_TIMEOUT)
    }

    async fn decode<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T, ReputationError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ReputationError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        serde_json::from_slice::<Envelope<T>>(&body)
            .map(|e| e.data)
            .map_err(|e| ReputationError::Decode(e.to_string()))
    }

    async fn cached_stats(&self, url: &str) -> Result<Option<ReputationStats>, ReputationError> {
        let resp = self
            .get(&format!("{}/urls/{}", self.base_url, url_id(url)))
            .send()
            .await?;
        // Anything but a stored result (404, 429, 5xx) falls through to a
        // fresh submission.
        if !resp.status().is_success() {
            log::debug!("No stored reputation for {} (HTTP {})", url, resp.status().as_u16());
            return Ok(None);
        }
        let object: UrlObject = Self::decode(resp).await?;
        Ok(Some(object.attributes.last_analysis_stats))
    }

    async fn submit(&self, url: &str) -> Result<String, ReputationError> {
        let resp = self
            .client
            .post(format!("{}/urls", self.base_url))
            .header("x-apikey", &self.api_key)
            .timeout(REPUTATION_REQUEST_TIMEOUT)
            .form(&[("url", url)])
            .send()
            .await?;
        let submission: Submission = Self::decode(resp).await?;
        Ok(submission.id)
    }

    async fn poll(
        &self,
        analysis_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ReputationStats>, ReputationError> {
        let analysis_url = format!("{}/analyses/{}", self.base_url, analysis_id);

        for attempt in 1..=self.max_polls {
            let resp = tokio::select! {
                _ = cancel.cancelled() => return Err(ReputationError::Cancelled),
                resp = self.get(&analysis_url).send() => resp?,
            };
            let analysis: AnalysisObject = Self::decode(resp).await?;
            if analysis.attributes.status == "completed" {
                log::debug!("Analysis {} completed after {} poll(s)", analysis_id, attempt);
                return Ok(Some(analysis.attributes.stats));
            }

            if attempt < self.max_polls {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ReputationError::Cancelled),
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }
        Ok(None)
    }

    async fn try_scan(&self, url: &str, cancel: &CancellationToken) -> Result<ReputationScan, ReputationError> {
        if let Some(stats) = self.cached_stats(url).await? {
            log::debug!("Used stored reputation result for {}", url);
            return Ok(ReputationScan {
                stats,
                source: ReputationSource::Cached,
            });
        }

        log::debug!("Submitting {} for analysis", url);
        let analysis_id = self.submit(url).await?;
        match self.poll(&analysis_id, cancel).await? {
            Some(stats) => Ok(ReputationScan {
                stats,
                source: ReputationSource::Analysis,
            }),
            None => {
                log::warn!(
                    "Reputation analysis for {} did not complete after {} polls",
                    url,
                    self.max_polls
                );
                Ok(ReputationScan::zero(ReputationSource::TimedOut))
            }
        }
    }
}

#[async_trait]
impl ReputationLookup for VirusTotalClient {
    async fn scan(&self, url: &str, cancel: &CancellationToken) -> ReputationScan {
        let outcome = match tokio::time::timeout(self.deadline, self.try_scan(url, cancel)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!(
                    "Reputation lookup for {} exceeded {:?}",
                    url,
                    self.deadline
                );
                return ReputationScan::zero(ReputationSource::TimedOut);
            }
        };
        match outcome {
            Ok(scan) => scan,
            Err(ReputationError::Cancelled) => {
                log::debug!("Reputation lookup cancelled for {}", url);
                ReputationScan::zero(ReputationSource::Cancelled)
            }
            Err(e) => {
                log::warn!("Reputation lookup failed for {}: {}", url, e);
                ReputationScan::zero(ReputationSource::Unavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_id_is_unpadded_urlsafe_sha256() {
        let id = url_id("http://www.example.com/");
        // SHA-256 is 32 bytes -> 43 base64 chars without padding
        assert_eq!(id.len(), 43);
        assert!(!id.contains('='));
        assert!(!id.contains('+') && !id.contains('/'));
        assert_eq!(id, url_id("http://www.example.com/"));
        assert_ne!(id, url_id("http://www.example.com"));
    }

    #[test]
    fn test_stats_ignore_unknown_fields() {
        let stats: ReputationStats = serde_json::from_str(
            r#"{"malicious": 2, "suspicious": 1, "harmless": 60, "undetected": 10, "timeout": 0}"#,
        )
        .unwrap();
        assert_eq!(stats.malicious, 2);
        assert_eq!(stats.undetected, 10);
    }

    #[test]
    fn test_degraded_signal_mapping() {
        assert_eq!(
            ReputationScan::zero(ReputationSource::TimedOut).degraded_signal(),
            Some(SignalType::ReputationTimeout)
        );
        assert_eq!(
            ReputationScan::zero(ReputationSource::Unavailable).degraded_signal(),
            Some(SignalType::Reputation)
        );
        assert_eq!(
            ReputationScan::zero(ReputationSource::Cached).degraded_signal(),
            None
        );
    }
}
