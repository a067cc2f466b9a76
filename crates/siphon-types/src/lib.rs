pub mod amount;
pub mod errors;
pub mod models;
pub mod payload;
pub mod record;
pub mod repository;
pub mod schema;
pub mod strategy;
pub mod table_name;

use diesel_async::{
    pooled_connection::bb8::{Pool, PooledConnection},
    AsyncPgConnection,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use amount::Amount;
pub use errors::{CredentialError, TableNameError};
pub use models::*;
pub use payload::*;
pub use record::QueueRecord;
pub use strategy::IndexingStrategy;
pub use table_name::TableName;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbPoolConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Ordered batch of events delivered under one receiver name.
pub type EventBatch = Vec<WebhookPayload>;

/// Result of persisting one event into one subscriber table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Inserted,
    /// The signature was already present in the destination table.
    Duplicate,
}
