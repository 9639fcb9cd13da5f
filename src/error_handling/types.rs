//! Error type definitions.
//!
//! This module defines the errors surfaced at the pipeline boundaries and the
//! signal types used to account for degraded sub-checks.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures. All of them are fatal at startup.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing an HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The reputation service credential is not configured.
    #[error("Reputation API key is not configured (set VT_API_KEY)")]
    MissingApiKey,

    /// The Public Suffix List could not be loaded.
    #[error("Public suffix list error: {0}")]
    SuffixListError(String),

    /// The phishing model could not be loaded.
    #[error("Phishing model error: {0}")]
    ModelError(String),

    /// The result cache database could not be opened.
    #[error("Result cache error: {0}")]
    DatabaseError(#[from] DatabaseError),
}

/// Error types for result cache database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Errors surfaced by the verdict pipeline to its caller.
///
/// Every degradable failure is recovered inside the pipeline; only these reach
/// the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerdictError {
    /// Missing or malformed URL or email.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Anything uncaught inside an evaluation stage.
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// The evaluation was cancelled by its caller.
    #[error("Evaluation cancelled")]
    Cancelled,
}

/// Errors from a redirect trace. Only the redirect-analysis entry point
/// surfaces them; the verdict pipeline degrades them to "no redirect".
#[derive(Error, Debug)]
pub enum TraceError {
    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The chain exceeded the hop budget.
    #[error("Too many redirects (more than {0} hops)")]
    TooManyRedirects(usize),

    /// The target could not be reached.
    #[error("URL unreachable: {0}")]
    Unreachable(String),

    /// The trace exceeded its deadline.
    #[error("Redirect trace timed out")]
    Timeout,
}

impl From<ReqwestError> for TraceError {
    fn from(e: ReqwestError) -> Self {
        if e.is_timeout() {
            TraceError::Timeout
        } else {
            TraceError::Unreachable(e.to_string())
        }
    }
}

/// Errors talking to the reputation service. Always recovered into
/// zero-valued stats.
#[derive(Error, Debug)]
pub enum ReputationError {
    /// Transport failure (connect, timeout, TLS).
    #[error("Reputation transport error: {0}")]
    Transport(#[from] ReqwestError),

    /// Unexpected HTTP status (auth failures, quota, server errors).
    #[error("Reputation service returned HTTP {0}")]
    Status(u16),

    /// Response body did not have the expected shape.
    #[error("Reputation response decode error: {0}")]
    Decode(String),

    /// The surrounding evaluation was cancelled while polling.
    #[error("Reputation polling cancelled")]
    Cancelled,
}

/// Sub-checks that can degrade to a neutral value without failing the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum SignalType {
    /// Redirect trace failed; the URL was used unchanged.
    RedirectTrace,
    /// Reputation service unreachable or returned an error.
    Reputation,
    /// Reputation analysis did not complete within the poll budget.
    ReputationTimeout,
    /// Registration (RDAP) lookup failed; sentinel values used.
    Registration,
    /// Host did not resolve.
    Dns,
    /// TLS certificate could not be fetched.
    Certificate,
    /// Result cache read or write failed.
    Cache,
    /// Alert delivery failed.
    AlertDelivery,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SignalType {
    /// Human-readable name used in logs and verdict details.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::RedirectTrace => "redirect trace unavailable",
            SignalType::Reputation => "reputation service unavailable",
            SignalType::ReputationTimeout => "reputation analysis timed out",
            SignalType::Registration => "registration data unavailable",
            SignalType::Dns => "host did not resolve",
            SignalType::Certificate => "certificate unavailable",
            SignalType::Cache => "result cache unavailable",
            SignalType::AlertDelivery => "alert delivery failed",
        }
    }
}
