//! Scoring and classification engine.
//!
//! Runs the evaluation stages in a fixed order over one URL, accumulating a
//! risk score:
//!
//! 1. Result cache probe (hit returns immediately)
//! 2. Homograph check on the raw URL (short-circuits)
//! 3. Redirect resolution, plus chain heuristics for multi-hop chains
//! 4. Homograph check on the resolved URL (short-circuits)
//! 5. Reputation lookup
//! 6. HTTPS check (short-circuits when absent)
//! 7. Lexical/registration scoring (short-circuits when not `Safe`)
//! 8. Phishing model (corroborating only)
//! 9. Final thresholding
//!
//! Every full evaluation is persisted keyed by the original URL, and every
//! non-safe verdict is handed to the alert queue without waiting on delivery.

mod context;
mod types;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use context::EngineContext;
pub use types::{
    RiskScore, VerdictDetails, VerdictExtra, VerdictRequest, VerdictResponse, NO_RISK_REASON,
};

use crate::config::{
    CHAIN_SUSPICIOUS_PENALTY, HOMOGRAPH_PENALTY, LEXICAL_MALICIOUS_PENALTY,
    LEXICAL_SUSPICIOUS_PENALTY, NO_HTTPS_PENALTY, PHISHING_MODEL_PENALTY,
    REPUTATION_MALICIOUS_PENALTY, REPUTATION_SUSPICIOUS_PENALTY,
};
use crate::error_handling::{SignalType, VerdictError};
use crate::homograph;
use crate::lexical::LexicalClass;
use crate::models::{Classification, ScanResult};
use crate::notify::Alert;
use crate::phishing::ModelFeatures;
use crate::redirect::{evaluate_chain, Resolution};
use crate::tls::check_https;
use crate::url_record::UrlRecord;

/// Reason for a homograph short-circuit.
pub const HOMOGRAPH_REASON: &str = "Detected homograph characters in URL";
/// Reason contributed by a suspicious redirect chain.
pub const CHAIN_REASON: &str = "Suspicious redirect chain";
/// Reason contributed by malicious reputation engines.
pub const REPUTATION_MALICIOUS_REASON: &str = "Detected as malicious by VirusTotal";
/// Reason contributed by suspicious reputation engines.
pub const REPUTATION_SUSPICIOUS_REASON: &str = "Detected as suspicious by VirusTotal";
/// Reason for the no-HTTPS short-circuit.
pub const NO_HTTPS_REASON: &str = "URL does not use HTTPS";
/// Reason for the lexical short-circuit.
pub const LEXICAL_REASON: &str = "Lexical analysis indicates risk";
/// Reason contributed by a positive phishing model prediction.
pub const PHISHING_MODEL_REASON: &str = "Phishing model flagged URL";

/// Per-evaluation state threaded through the stages.
struct Evaluation<'a> {
    record: UrlRecord,
    email: &'a str,
    score: RiskScore,
    extra: VerdictExtra,
    resolution: Option<Resolution>,
}

impl Evaluation<'_> {
    fn target_url(&self) -> &str {
        self.resolution
            .as_ref()
            .map(|r| r.final_url.as_str())
            .unwrap_or_else(|| self.record.as_str())
    }
}

/// Classifies URLs. Cheap to clone; clones share collaborators.
#[derive(Clone)]
pub struct ScanEngine {
    ctx: Arc<EngineContext>,
}

impl ScanEngine {
    /// Creates an engine over the given collaborators.
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// Shared collaborators.
    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Evaluates a request on a separate task.
    ///
    /// A panic inside any stage is reported as `VerdictError::Unexpected`
    /// rather than unwinding into the caller. Cancelling `cancel` stops the
    /// evaluation at its next await point.
    ///
    /// # Errors
    ///
    /// See [`ScanEngine::evaluate`].
    pub async fn evaluate_guarded(
        &self,
        request: VerdictRequest,
        cancel: CancellationToken,
    ) -> Result<VerdictResponse, VerdictError> {
        let engine = self.clone();
        let handle = tokio::spawn(async move { engine.evaluate(&request, &cancel).await });
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                log::error!("Evaluation panicked: {}", e);
                Err(VerdictError::Unexpected("evaluation panicked".to_string()))
            }
            Err(_) => Err(VerdictError::Cancelled),
        }
    }

    /// Evaluates one request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the URL or email is missing or the URL is
    /// malformed, and `Cancelled` when `cancel` fires first. Every other
    /// failure degrades inside its stage.
    pub async fn evaluate(
        &self,
        request: &VerdictRequest,
        cancel: &CancellationToken,
    ) -> Result<VerdictResponse, VerdictError> {
        let (url, email) = request.validate()?;
        let record = UrlRecord::parse(url)?;
        self.ctx.stats.record_evaluation();

        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("Evaluation of {} cancelled", record);
                Err(VerdictError::Cancelled)
            }
            response = self.run(url, record.clone(), email, cancel) => {
                log::info!(
                    "Verdict for {}: {} ({})",
                    record,
                    response.classification,
                    response.reason
                );
                self.ctx.stats.record_verdict(response.classification);
                Ok(response)
            }
        }
    }

    async fn run(
        &self,
        raw: &str,
        record: UrlRecord,
        email: &str,
        cancel: &CancellationToken,
    ) -> VerdictResponse {
        if let Some(hit) = self.cached_verdict(&record, email).await {
            return hit;
        }

        let mut eval = Evaluation {
            record,
            email,
            score: RiskScore::default(),
            extra: VerdictExtra::default(),
            resolution: None,
        };

        // Raw URL homograph check
        let report = homograph::detect(raw);
        if report.is_suspicious() {
            log::debug!("Homograph characters in raw URL {}: {}", raw, report.characters());
            eval.extra.suspicious_characters = Some(report);
            eval.score.add(HOMOGRAPH_PENALTY, HOMOGRAPH_REASON);
            // Resolve for the reported destination only; the verdict stays
            // the homograph score.
            self.resolve(&mut eval, false).await;
            return self.conclude(eval).await;
        }

        self.resolve(&mut eval, true).await;

        // Resolved URL homograph check
        let report = homograph::detect(eval.target_url());
        if report.is_suspicious() {
            log::debug!(
                "Homograph characters in resolved URL {}: {}",
                eval.target_url(),
                report.characters()
            );
            eval.extra.suspicious_characters = Some(report);
            eval.score.add(HOMOGRAPH_PENALTY, HOMOGRAPH_REASON);
            return self.conclude(eval).await;
        }

        self.reputation(&mut eval, cancel).await;

        if !self.https(&mut eval).await {
            return self.conclude(eval).await;
        }

        if !self.lexical(&mut eval).await {
            return self.conclude(eval).await;
        }

        self.phishing_model(&mut eval);
        self.conclude(eval).await
    }

    async fn cached_verdict(&self, record: &UrlRecord, email: &str) -> Option<VerdictResponse> {
        let cached = match self.ctx.cache.get(record.as_str()).await {
            Ok(cached) => cached?,
            Err(e) => {
                self.ctx.stats.record_degraded(SignalType::Cache);
                log::warn!("Result cache read failed for {}: {:#}", record, e);
                return None;
            }
        };

        log::debug!("Result cache hit for {}", record);
        self.ctx.stats.record_cache_hit();
        if cached.classification.is_alerting() {
            self.alert(email, &cached.url, cached.classification, &cached.reason);
        }

        Some(VerdictResponse {
            classification: cached.classification,
            reason: cached.reason,
            details: VerdictDetails {
                score: None,
                is_shortened: false,
                expanded_url: cached.url,
                extra: Some(VerdictExtra {
                    cached: true,
                    ..Default::default()
                }),
            },
        })
    }

    /// Traces the redirect chain. The chain penalty is applied only when
    /// `score_chain` is set; the chain verdict is reported either way.
    async fn resolve(&self, eval: &mut Evaluation<'_>, score_chain: bool) {
        // The record was validated already, so this only fails on an
        // internal inconsistency; treat that like a failed trace.
        let resolution = match self.ctx.resolver.resolve(eval.record.as_str()).await {
            Ok(resolution) => resolution,
            Err(e) => {
                log::warn!("Redirect resolution rejected {}: {}", eval.record, e);
                Resolution {
                    is_shortened: false,
                    final_url: eval.record.as_str().to_string(),
                    chain: vec![eval.record.as_str().to_string()],
                    degraded: true,
                }
            }
        };

        if resolution.degraded {
            self.degrade(eval, SignalType::RedirectTrace);
        }

        if resolution.chain.len() > 1 {
            let verdict = evaluate_chain(&resolution.chain);
            if verdict.is_suspicious() {
                log::debug!("Suspicious chain for {}: {:?}", eval.record, verdict.issues);
                if score_chain {
                    eval.score.add(CHAIN_SUSPICIOUS_PENALTY, CHAIN_REASON);
                }
            }
            eval.extra.chain_verdict = Some(verdict);
            eval.extra.redirect_chain = resolution.chain.clone();
        }

        eval.resolution = Some(resolution);
    }

    async fn reputation(&self, eval: &mut Evaluation<'_>, cancel: &CancellationToken) {
        let scan = self.ctx.reputation.scan(eval.target_url(), cancel).await;
        if let Some(signal) = scan.degraded_signal() {
            self.degrade(eval, signal);
        }
        if scan.stats.malicious > 0 {
            eval.score
                .add(REPUTATION_MALICIOUS_PENALTY, REPUTATION_MALICIOUS_REASON);
        } else if scan.stats.suspicious > 0 {
            eval.score
                .add(REPUTATION_SUSPICIOUS_PENALTY, REPUTATION_SUSPICIOUS_REASON);
        }
        eval.extra.reputation = Some(scan);
    }

    /// Returns `false` when the evaluation should stop here.
    async fn https(&self, eval: &mut Evaluation<'_>) -> bool {
        let report = check_https(self.ctx.certificates.as_ref(), eval.target_url()).await;
        if report.probe_failed() {
            self.degrade(eval, SignalType::Certificate);
        }
        let is_https = report.is_https;
        eval.extra.https = Some(report);
        if !is_https {
            eval.score.add(NO_HTTPS_PENALTY, NO_HTTPS_REASON);
        }
        is_https
    }

    /// Returns `false` when the evaluation should stop here.
    async fn lexical(&self, eval: &mut Evaluation<'_>) -> bool {
        let report = self.ctx.features.analyze(eval.target_url()).await;
        for signal in &report.degraded {
            self.degrade(eval, *signal);
        }
        let class = report.classification;
        eval.extra.lexical = Some(report);
        if !class.is_risky() {
            return true;
        }
        let penalty = match class {
            LexicalClass::LikelyMalicious => LEXICAL_MALICIOUS_PENALTY,
            _ => LEXICAL_SUSPICIOUS_PENALTY,
        };
        eval.score.add(penalty, LEXICAL_REASON);
        false
    }

    fn phishing_model(&self, eval: &mut Evaluation<'_>) {
        let resolved = eval
            .extra
            .lexical
            .as_ref()
            .map(|l| l.features.resolved_ip.is_some());
        let features = ModelFeatures::extract(eval.target_url(), resolved);
        let prediction = self.ctx.model.predict(&features);
        if prediction.is_phishing {
            eval.score.add(PHISHING_MODEL_PENALTY, PHISHING_MODEL_REASON);
        }
        eval.extra.phishing_model = Some(prediction);
    }

    async fn conclude(&self, mut eval: Evaluation<'_>) -> VerdictResponse {
        let classification = eval.score.classification();
        let reason = eval.score.reason();

        let result = ScanResult::new(eval.record.as_str(), classification, reason.clone());
        if let Err(e) = self.ctx.cache.put(&result).await {
            self.degrade(&mut eval, SignalType::Cache);
            log::warn!("Result cache write failed for {}: {:#}", eval.record, e);
        }

        if classification.is_alerting() {
            self.alert(eval.email, eval.target_url(), classification, &reason);
        }

        let (is_shortened, expanded_url) = match eval.resolution {
            Some(r) => (r.is_shortened, r.final_url),
            None => (false, eval.record.into_string()),
        };

        VerdictResponse {
            classification,
            reason,
            details: VerdictDetails {
                score: Some(eval.score.total()),
                is_shortened,
                expanded_url,
                extra: Some(eval.extra),
            },
        }
    }

    fn degrade(&self, eval: &mut Evaluation<'_>, signal: SignalType) {
        self.ctx.stats.record_degraded(signal);
        eval.extra.note_degraded(signal);
    }

    fn alert(&self, email: &str, url: &str, status: Classification, reason: &str) {
        self.ctx.alerts.enqueue(Alert {
            email: email.to_string(),
            url: url.to_string(),
            status,
            reason: reason.to_string(),
        });
    }
}
