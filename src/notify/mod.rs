//! Outbound alert queue.
//!
//! The engine enqueues an [`Alert`] and returns immediately; a worker task
//! drains the queue through an [`AlertSender`]. Delivery failures are logged,
//! counted, and dropped. The queue outlives any single evaluation, so
//! cancelling a request never cancels an alert that was already enqueued.

mod sender;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use sender::{AlertSender, LogAlertSender, WebhookAlertSender};

use crate::error_handling::{PipelineStats, SignalType};
use crate::models::Classification;

/// A notification that a URL was classified as non-safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Recipient address
    pub email: String,
    /// URL the verdict applies to
    pub url: String,
    /// Verdict
    pub status: Classification,
    /// Verdict reason
    pub reason: String,
}

impl Alert {
    /// Mail subject line.
    pub fn subject(&self) -> String {
        format!(
            "[SafeSurf] Alert: {} URL detected",
            self.status.as_ref().to_uppercase()
        )
    }

    /// Mail body.
    pub fn body(&self) -> String {
        format!(
            "Hello,\n\n\
             You just visited a URL that was classified as *{}*.\n\n\
             URL: {}\n\
             Reason: {}\n\n\
             Please proceed with caution.\n\n\
             - SafeSurf Security Team\n",
            self.status.as_ref().to_uppercase(),
            self.url,
            self.reason
        )
    }
}

/// Sending half of the alert queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AlertQueue {
    tx: mpsc::UnboundedSender<Alert>,
}

impl AlertQueue {
    /// Creates a queue and the receiver a worker should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Creates a queue with a worker already draining it through `sender`.
    pub fn spawn(sender: Arc<dyn AlertSender>, stats: Arc<PipelineStats>) -> (Self, JoinHandle<()>) {
        let (queue, rx) = Self::channel();
        let worker = spawn_alert_worker(rx, sender, stats);
        (queue, worker)
    }

    /// Enqueues an alert without waiting. Returns `false` if the worker has
    /// stopped.
    pub fn enqueue(&self, alert: Alert) -> bool {
        let url = alert.url.clone();
        match self.tx.send(alert) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("Alert worker stopped, dropping alert for {}", url);
                false
            }
        }
    }
}

/// Drains `rx` until every sender is dropped.
pub fn spawn_alert_worker(
    mut rx: mpsc::UnboundedReceiver<Alert>,
    sender: Arc<dyn AlertSender>,
    stats: Arc<PipelineStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(alert) = rx.recv().await {
            match sender.send(&alert).await {
                Ok(()) => log::debug!("Alert delivered to {} for {}", alert.email, alert.url),
                Err(e) => {
                    stats.record_degraded(SignalType::AlertDelivery);
                    log::warn!(
                        "Failed to deliver alert to {} for {}: {:#}",
                        alert.email,
                        alert.url,
                        e
                    );
                }
            }
        }
        log::debug!("Alert queue closed");
    })
}
