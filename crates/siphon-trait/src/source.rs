use anyhow::Result;
use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use siphon_types::{IndexingStrategy, SubscriptionLookupModel, UserDatabaseCredential};

/// Read side of the subscription lookup projection.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// All lookup rows for `strategy` routed through the webhook named `receiver`.
    async fn lookups_for(
        &self,
        strategy: IndexingStrategy,
        receiver: &str,
    ) -> Result<Vec<SubscriptionLookupModel>>;
}

#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// `Ok(None)` when the user has no database registered.
    async fn credential_for(&self, user_id: &str) -> Result<Option<UserDatabaseCredential>>;
}
