pub mod bootstrap;
pub mod credential;
pub mod receiver;
pub mod registry;
pub mod subscription;

use std::time::Duration;

use anyhow::Result;

pub use bootstrap::*;
pub use credential::*;
pub use receiver::*;
pub use registry::*;
pub use subscription::*;

use crate::{DbPool, DbPoolConnection};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Check a connection out of the control plane pool, giving up after five seconds.
pub async fn acquire(db: &DbPool) -> Result<DbPoolConnection<'_>> {
    match tokio::time::timeout(ACQUIRE_TIMEOUT, db.get()).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::error!("Timed out waiting for database connection");
            Err(anyhow::anyhow!("Timed out waiting for database connection"))
        }
    }
}
