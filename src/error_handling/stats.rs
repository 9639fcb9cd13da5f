//! Pipeline statistics tracking.
//!
//! Thread-safe counters for evaluations, verdicts, and degraded signals.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::SignalType;
use crate::models::Classification;

/// Thread-safe pipeline statistics tracker.
///
/// All counters are initialized to zero on creation and can be shared across
/// concurrent evaluations through an `Arc`.
pub struct PipelineStats {
    evaluations: AtomicUsize,
    cache_hits: AtomicUsize,
    verdicts: HashMap<Classification, AtomicUsize>,
    degraded: HashMap<SignalType, AtomicUsize>,
}

impl PipelineStats {
    /// Creates a tracker with every counter at zero.
    pub fn new() -> Self {
        let mut verdicts = HashMap::new();
        for classification in Classification::iter() {
            verdicts.insert(classification, AtomicUsize::new(0));
        }

        let mut degraded = HashMap::new();
        for signal in SignalType::iter() {
            degraded.insert(signal, AtomicUsize::new(0));
        }

        PipelineStats {
            evaluations: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            verdicts,
            degraded,
        }
    }

    /// Records the start of an evaluation.
    pub fn record_evaluation(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a verdict served from the result cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a final verdict.
    pub fn record_verdict(&self, classification: Classification) {
        if let Some(counter) = self.verdicts.get(&classification) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a sub-check that degraded to its neutral value.
    pub fn record_degraded(&self, signal: SignalType) {
        if let Some(counter) = self.degraded.get(&signal) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment degraded counter for {:?} which is not in the map",
                signal
            );
        }
    }

    /// Evaluations started.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }

    /// Verdicts served from the result cache.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::SeqCst)
    }

    /// Verdicts with `classification`.
    pub fn verdict_count(&self, classification: Classification) -> usize {
        self.verdicts
            .get(&classification)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Times `signal` degraded.
    pub fn degraded_count(&self, signal: SignalType) -> usize {
        self.degraded
            .get(&signal)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Degraded signals across all types.
    pub fn total_degraded(&self) -> usize {
        self.degraded.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}
