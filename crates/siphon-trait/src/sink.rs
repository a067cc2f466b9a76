use anyhow::Result;
use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use siphon_types::{SubscriptionLookupModel, WebhookPayload, WriteOutcome};

/// Persists one event for one matched subscriber.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait TenantSink: Send + Sync {
    async fn deliver(
        &self,
        target: &SubscriptionLookupModel,
        payload: &WebhookPayload,
    ) -> Result<WriteOutcome>;
}
