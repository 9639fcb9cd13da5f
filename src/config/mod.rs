//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, penalties, thresholds)
//! - The library `Config` and CLI option enums

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, TraceMode};
