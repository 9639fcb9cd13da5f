//! Error handling and pipeline statistics.
//!
//! This module provides:
//! - Boundary error types (`VerdictError`, `TraceError`, `InitializationError`)
//! - Collaborator error types that are always recovered locally
//! - `SignalType`, naming each sub-check that may degrade to a neutral value
//! - `PipelineStats`, atomic counters for verdicts and degraded signals

mod stats;
mod types;

// Re-export public API
pub use stats::PipelineStats;
pub use types::{
    DatabaseError, InitializationError, ReputationError, SignalType, TraceError, VerdictError,
};
