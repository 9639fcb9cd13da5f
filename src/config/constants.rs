//! Configuration constants.
//!
//! Timeouts, bounds, stage penalties, and classification thresholds used
//! throughout the risk-evaluation pipeline.

use std::time::Duration;

/// Maximum URL length (2048 characters), matching common browser and server limits.
pub const MAX_URL_LENGTH: usize = 2048;

// Redirect resolution
/// Hard timeout for a full redirect trace.
pub const REDIRECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of redirect hops to follow before giving up.
pub const MAX_REDIRECT_HOPS: usize = 10;
/// Maximum HTML bytes inspected for client-side redirects on a landed page.
pub const MAX_RENDERED_BODY_SIZE: usize = 512 * 1024;

// Reputation service
/// Default base URL of the reputation service API.
pub const DEFAULT_REPUTATION_BASE_URL: &str = "https://www.virustotal.com/api/v3";
/// Per-request timeout for reputation service calls.
pub const REPUTATION_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Wall-clock budget for a whole lookup, stored result through final poll.
pub const REPUTATION_DEADLINE: Duration = Duration::from_secs(30);
/// Delay between analysis status polls.
pub const REPUTATION_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Maximum number of analysis status polls (15 x 2s = 30s wall time).
pub const REPUTATION_MAX_POLLS: usize = 15;

// Network operation timeouts
/// DNS query timeout in seconds
pub const DNS_TIMEOUT_SECS: u64 = 3;
/// Registration (RDAP) lookup timeout in seconds
pub const WHOIS_TIMEOUT_SECS: u64 = 5;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// TLS handshake timeout in seconds
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;

/// Default RDAP bootstrap service.
pub const DEFAULT_RDAP_BASE_URL: &str = "https://rdap.org";

/// Default User-Agent string for outbound HTTP requests.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default listen address for the HTTP API.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

// Stage penalties (added to the running risk score when the rule fires)
/// Homograph characters in the raw or resolved URL.
pub const HOMOGRAPH_PENALTY: u32 = 50;
/// Redirect chain judged suspicious by the chain heuristics.
pub const CHAIN_SUSPICIOUS_PENALTY: u32 = 10;
/// At least one reputation engine reports the URL as malicious.
pub const REPUTATION_MALICIOUS_PENALTY: u32 = 70;
/// At least one reputation engine reports the URL as suspicious.
pub const REPUTATION_SUSPICIOUS_PENALTY: u32 = 50;
/// Destination is not served over HTTPS.
pub const NO_HTTPS_PENALTY: u32 = 50;
/// Lexical sub-classification `Suspicious`.
pub const LEXICAL_SUSPICIOUS_PENALTY: u32 = 50;
/// Lexical sub-classification `Likely Malicious`.
pub const LEXICAL_MALICIOUS_PENALTY: u32 = 70;
/// Phishing model predicted a positive label.
pub const PHISHING_MODEL_PENALTY: u32 = 20;

// Final thresholds
/// Cumulative score at or above which a URL is `malicious`.
pub const MALICIOUS_THRESHOLD: u32 = 70;
/// Cumulative score at or above which a URL is `suspicious`.
pub const SUSPICIOUS_THRESHOLD: u32 = 50;

// Lexical thresholds
/// Highest lexical score still classified `Safe`.
pub const LEXICAL_SAFE_MAX: u32 = 30;
/// Highest lexical score still classified `Suspicious`.
pub const LEXICAL_SUSPICIOUS_MAX: u32 = 60;
