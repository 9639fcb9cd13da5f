//! HTTP client initialization.
//!
//! Two clients are built: a general one for API calls (reputation, RDAP,
//! webhooks) and one with redirects disabled so tracers can record each hop.

use reqwest::ClientBuilder;

use crate::config::Config;

/// Initializes the HTTP client used for API calls.
///
/// Configured with the User-Agent and timeout from `config`, redirect
/// following enabled, and the rustls TLS backend.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()
}

/// Initializes the HTTP client for redirect tracing.
///
/// Redirects are disabled so the tracer can capture every intermediate URL.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_redirect_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_build_from_default_config() {
        let config = Config::default();
        assert!(init_client(&config).is_ok());
        assert!(init_redirect_client(&config).is_ok());
    }
}
