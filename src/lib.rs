//! safe_surf library: URL risk evaluation
//!
//! Classifies a URL as `safe`, `suspicious`, or `malicious` before a browser
//! visits it. Redirects are resolved and their chain inspected, homograph
//! spoofing is detected, and lexical, registration, reputation, certificate,
//! and model signals are fused into one score with an auditable reason.
//!
//! # Example
//!
//! ```no_run
//! use safe_surf::initialization::init_resources;
//! use safe_surf::{Config, VerdictRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     reputation_api_key: Some(std::env::var("VT_API_KEY")?),
//!     ..Default::default()
//! };
//! let resources = init_resources(&config).await?;
//!
//! let verdict = resources
//!     .engine
//!     .evaluate(
//!         &VerdictRequest::new("bit.ly/example", "me@example.com"),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("{}: {}", verdict.classification, verdict.reason);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod dns;
pub mod domain;
pub mod engine;
pub mod error_handling;
pub mod homograph;
pub mod initialization;
pub mod lexical;
pub mod models;
pub mod notify;
pub mod phishing;
pub mod redirect;
pub mod reputation;
pub mod server;
pub mod tls;
pub mod url_record;
pub mod whois;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, TraceMode};
pub use engine::{ScanEngine, VerdictRequest, VerdictResponse};
pub use error_handling::{InitializationError, SignalType, TraceError, VerdictError};
pub use models::{Classification, ScanResult};
pub use url_record::UrlRecord;
