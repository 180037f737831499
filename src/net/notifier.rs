use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::core::diff::TransitionEvent;

/// Hard cap on one webhook delivery.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook rejected the batch: {0}")]
    Rejected(StatusCode),
}

/// Outbound transport for transition batches, injectable so the throttle
/// and the monitor loop can be tested without a network.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn push(&self, events: &[TransitionEvent]) -> Result<(), NotifyError>;
}

/// Production transport: JSON POST to a fixed URL under [`PUSH_TIMEOUT`].
pub struct Webhook {
    client: reqwest::Client,
    url: String,
}

impl Webhook {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(PUSH_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

fn payload(events: &[TransitionEvent]) -> serde_json::Value {
    json!({ "update": events })
}

#[async_trait]
impl Notify for Webhook {
    async fn push(&self, events: &[TransitionEvent]) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&payload(events))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status()));
        }
        Ok(())
    }
}

/// At-most-one-batch-per-cooldown-window delivery.
///
/// Suppressed batches are dropped, not queued; the transition log is the
/// durable record of every event.
pub struct NotificationThrottle {
    transport: Box<dyn Notify>,
    cooldown: Duration,
    last_sent: Option<Instant>,
}

impl NotificationThrottle {
    pub fn new(transport: Box<dyn Notify>, cooldown: Duration) -> Self {
        Self {
            transport,
            cooldown,
            last_sent: None,
        }
    }

    /// Never fails the caller. A failed delivery leaves the timestamp
    /// untouched so the next batch gets another attempt instead of being
    /// penalized by the failed one.
    pub async fn maybe_send(&mut self, events: &[TransitionEvent]) {
        if events.is_empty() {
            return;
        }
        if let Some(sent) = self.last_sent {
            if sent.elapsed() <= self.cooldown {
                tracing::debug!(dropped = events.len(), "cooldown active, dropping batch");
                return;
            }
        }
        match self.transport.push(events).await {
            Ok(()) => {
                self.last_sent = Some(Instant::now());
                tracing::debug!(delivered = events.len(), "webhook batch delivered");
            }
            Err(err) => tracing::warn!(%err, "webhook delivery failed"),
        }
    }
}
