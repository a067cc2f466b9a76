use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{strategy::UnknownStrategy, IndexingStrategy, TableName};

#[derive(
    Queryable, Selectable, Insertable, Identifiable, AsChangeset, Debug, Clone, Serialize, ToSchema,
)]
#[diesel(table_name = crate::schema::subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionModel {
    pub id: String,
    pub user_id: String,
    pub token_address: String,
    pub indexing_strategy: Vec<String>,
    pub table_name: String,
    pub webhook_id: String,
    pub status: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Denormalized (strategy, webhook) → (address, user, table) row read on the hot path.
#[derive(
    Queryable, Selectable, Insertable, Identifiable, Debug, Clone, Serialize, ToSchema, PartialEq,
)]
#[diesel(table_name = crate::schema::subscription_lookup)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionLookupModel {
    pub id: String,
    pub subscription_id: String,
    pub token_address: String,
    pub user_id: String,
    pub strategy: String,
    pub table_name: String,
    pub helius_webhook_id: String,
    pub last_updated: NaiveDateTime,
}

/// Input for creating a subscription once its address and table name are settled.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: String,
    pub token_address: String,
    pub strategies: BTreeSet<IndexingStrategy>,
    pub table_name: TableName,
    pub webhook_id: String,
}

impl NewSubscription {
    pub fn into_model(self, now: NaiveDateTime) -> SubscriptionModel {
        SubscriptionModel {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id,
            token_address: self.token_address,
            indexing_strategy: self.strategies.iter().map(|s| s.to_string()).collect(),
            table_name: self.table_name.as_str().to_string(),
            webhook_id: self.webhook_id,
            status: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl SubscriptionModel {
    pub fn strategies(&self) -> Result<BTreeSet<IndexingStrategy>, UnknownStrategy> {
        self.indexing_strategy.iter().map(|s| s.parse()).collect()
    }

    /// The lookup projection of this subscription: one row per distinct strategy, none
    /// while the subscription is inactive.
    pub fn lookup_rows(&self, now: NaiveDateTime) -> Result<Vec<SubscriptionLookupModel>, UnknownStrategy> {
        if !self.status {
            return Ok(Vec::new());
        }
        let rows = self
            .strategies()?
            .into_iter()
            .map(|strategy| SubscriptionLookupModel {
                id: uuid::Uuid::new_v4().to_string(),
                subscription_id: self.id.clone(),
                token_address: self.token_address.clone(),
                user_id: self.user_id.clone(),
                strategy: strategy.to_string(),
                table_name: self.table_name.clone(),
                helius_webhook_id: self.webhook_id.clone(),
                last_updated: now,
            })
            .collect();
        Ok(rows)
    }
}
