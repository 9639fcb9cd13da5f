//! HTTP API.
//!
//! Provides three endpoints:
//! - `POST /check-url` - full verdict for `{url, email}`
//! - `POST /redirect-analyzer` - redirect chain analysis for `{url}`
//! - `GET /status` - pipeline counters

mod handlers;
mod types;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use handlers::{check_url_handler, redirect_analyzer_handler, status_handler};
pub use types::{ErrorBody, RedirectRequest, ServerState, StatusResponse};

/// Builds the router over `state`.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/check-url", post(check_url_handler))
        .route("/redirect-analyzer", post(redirect_analyzer_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: &str, state: ServerState) -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind API server to {}: {}", addr, e))?;

    log::info!("API server listening on http://{}/", addr);
    log::info!("  - Verdicts: POST http://{}/check-url", addr);
    log::info!("  - Redirects: POST http://{}/redirect-analyzer", addr);
    log::info!("  - Status: GET http://{}/status", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            log::info!("Shutting down API server");
        })
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))?;

    Ok(())
}
