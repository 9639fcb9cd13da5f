//! Configuration types.
//!
//! This module defines the library configuration and the enums used for
//! command-line argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_LISTEN_ADDR, DEFAULT_RDAP_BASE_URL, DEFAULT_REPUTATION_BASE_URL, DEFAULT_USER_AGENT,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Which redirect tracer implementation the pipeline uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TraceMode {
    /// HTTP-level `Location` following only.
    Http,
    /// HTTP redirects plus client-side (meta refresh / script) redirects.
    Rendered,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use safe_surf::Config;
///
/// let config = Config {
///     reputation_api_key: Some("key".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to
    pub listen_addr: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Reputation service credential (required at startup)
    pub reputation_api_key: Option<String>,

    /// Reputation service base URL
    pub reputation_base_url: String,

    /// RDAP bootstrap base URL for registration lookups
    pub rdap_base_url: String,

    /// Redirect tracer implementation
    pub trace_mode: TraceMode,

    /// Per-request timeout for outbound HTTP calls
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// SQLite file for the result cache; in-memory cache when `None`
    pub cache_db: Option<PathBuf>,

    /// Directory for on-disk registration lookup cache
    pub whois_cache_dir: Option<PathBuf>,

    /// Full Public Suffix List file replacing the bundled snapshot
    pub suffix_list: Option<PathBuf>,

    /// JSON weights file for the phishing model
    pub model_path: Option<PathBuf>,

    /// Webhook receiving alert notifications; alerts are only logged when `None`
    pub alert_webhook: Option<String>,
}

impl Config {
    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            reputation_api_key: None,
            reputation_base_url: DEFAULT_REPUTATION_BASE_URL.to_string(),
            rdap_base_url: DEFAULT_RDAP_BASE_URL.to_string(),
            trace_mode: TraceMode::Http,
            timeout_seconds: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_db: None,
            whois_cache_dir: None,
            suffix_list: None,
            model_path: None,
            alert_webhook: None,
        }
    }
}
