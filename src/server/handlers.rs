//! Request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use super::types::{ErrorBody, RedirectRequest, ServerState, StatusResponse};
use crate::engine::VerdictRequest;
use crate::error_handling::{SignalType, VerdictError};
use crate::models::Classification;
use crate::redirect::{analyze_redirects, RedirectReport};

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

fn verdict_error_response(error: VerdictError) -> Response {
    match error {
        VerdictError::InvalidInput(message) => error_response(StatusCode::BAD_REQUEST, message),
        VerdictError::Cancelled => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Evaluation cancelled")
        }
        VerdictError::Unexpected(message) => {
            log::error!("Evaluation failed: {}", message);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// `POST /check-url`
///
/// The evaluation is cancelled if the client disconnects: dropping this
/// handler's future drops the guard, which cancels the token.
pub async fn check_url_handler(
    State(state): State<ServerState>,
    Json(request): Json<VerdictRequest>,
) -> Response {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match state.engine.evaluate_guarded(request, cancel).await {
        Ok(verdict) => Json(verdict).into_response(),
        Err(e) => verdict_error_response(e),
    }
}

/// `POST /redirect-analyzer`
pub async fn redirect_analyzer_handler(
    State(state): State<ServerState>,
    Json(request): Json<RedirectRequest>,
) -> Response {
    let Some(url) = request.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing URL");
    };

    match analyze_redirects(state.tracer.as_ref(), &url).await {
        Ok(report @ RedirectReport::Analyzed { .. }) => Json(report).into_response(),
        Ok(report @ RedirectReport::Failed { .. }) => {
            (StatusCode::BAD_GATEWAY, Json(report)).into_response()
        }
        Err(e) => verdict_error_response(e),
    }
}

/// `GET /status`
pub async fn status_handler(State(state): State<ServerState>) -> Response {
    let stats = &state.engine.context().stats;
    let response = StatusResponse {
        uptime_seconds: state.start_time.elapsed().as_secs_f64(),
        evaluations: stats.evaluations(),
        cache_hits: stats.cache_hits(),
        verdicts: Classification::iter()
            .map(|c| (c.to_string(), stats.verdict_count(c)))
            .collect(),
        degraded: SignalType::iter()
            .map(|s| (s.as_str().to_string(), stats.degraded_count(s)))
            .collect(),
    };
    (StatusCode::OK, Json(response)).into_response()
}
