use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use siphon_trait::{CredentialSource, SubscriptionSource};
use siphon_types::{
    repository::{get_database_credential, get_lookups_for_receiver},
    DbPool, IndexingStrategy, SubscriptionLookupModel, UserDatabaseCredential,
};

/// The shared control plane database seen through the matcher's and router's seams.
#[derive(Clone)]
pub struct ControlPlane {
    db: Arc<DbPool>,
}

impl ControlPlane {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionSource for ControlPlane {
    async fn lookups_for(
        &self,
        strategy: IndexingStrategy,
        receiver: &str,
    ) -> Result<Vec<SubscriptionLookupModel>> {
        get_lookups_for_receiver(&self.db, strategy, receiver).await
    }
}

#[async_trait]
impl CredentialSource for ControlPlane {
    async fn credential_for(&self, user_id: &str) -> Result<Option<UserDatabaseCredential>> {
        get_database_credential(&self.db, user_id).await
    }
}
