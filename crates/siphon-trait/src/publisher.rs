use anyhow::Result;
use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use siphon_types::WebhookPayload;

/// Accepts a raw batch of events for a named receiver and enqueues it.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Resolves once the broker has acknowledged the batch.
    async fn publish(&self, receiver: &str, events: &[WebhookPayload]) -> Result<()>;
}
