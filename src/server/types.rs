//! Server state and response bodies.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::engine::ScanEngine;
use crate::redirect::RedirectTracer;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct ServerState {
    /// Verdict pipeline
    pub engine: ScanEngine,
    /// Tracer for the redirect-analysis endpoint
    pub tracer: Arc<dyn RedirectTracer>,
    /// Server start
    pub start_time: Arc<Instant>,
}

impl ServerState {
    /// Creates state with the clock starting now.
    pub fn new(engine: ScanEngine, tracer: Arc<dyn RedirectTracer>) -> Self {
        Self {
            engine,
            tracer,
            start_time: Arc::new(Instant::now()),
        }
    }
}

/// Body of `POST /redirect-analyzer`
#[derive(Debug, Default, Deserialize)]
pub struct RedirectRequest {
    /// URL to trace
    #[serde(default)]
    pub url: Option<String>,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
}

/// JSON response for `/status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Seconds since start
    pub uptime_seconds: f64,
    /// Evaluations started
    pub evaluations: usize,
    /// Verdicts served from the result cache
    pub cache_hits: usize,
    /// Verdicts by classification
    pub verdicts: BTreeMap<String, usize>,
    /// Degraded sub-checks by name
    pub degraded: BTreeMap<String, usize>,
}
