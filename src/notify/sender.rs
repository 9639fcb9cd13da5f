//! Alert delivery backends.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use super::Alert;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers one alert.
#[async_trait]
pub trait AlertSender: Send + Sync {
    /// Sends `alert`.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery fails; the caller logs and drops it.
    async fn send(&self, alert: &Alert) -> Result<()>;
}

/// Writes the rendered alert mail to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSender;

#[async_trait]
impl AlertSender for LogAlertSender {
    async fn send(&self, alert: &Alert) -> Result<()> {
        log::info!(
            "Alert for {}: {}\n{}",
            alert.email,
            alert.subject(),
            alert.body()
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    email: &'a str,
    subject: String,
    body: String,
    url: &'a str,
    status: &'a str,
    reason: &'a str,
}

/// POSTs each alert as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookAlertSender {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookAlertSender {
    /// Creates a sender for `endpoint`.
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let payload = WebhookPayload {
            email: &alert.email,
            subject: alert.subject(),
            body: alert.body(),
            url: &alert.url,
            status: alert.status.as_ref(),
            reason: &alert.reason,
        };
        self.client
            .post(&self.endpoint)
            .timeout(WEBHOOK_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("webhook request to {} failed", self.endpoint))?
            .error_for_status()
            .context("webhook rejected alert")?;
        Ok(())
    }
}
