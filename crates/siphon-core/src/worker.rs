use std::sync::Arc;

use anyhow::Result;
use siphon_types::{repository::ensure_control_plane_schema, DbPool};

use crate::{
    control::ControlPlane,
    db::new_db_pool,
    delivery::TenantDelivery,
    matcher::{Matcher, SingleSlotCache},
    queue::{EventConsumer, KafkaOptions},
    tenant::{TenantPoolOptions, TenantRouter},
    writer::PayloadWriter,
};

#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    pub kafka: KafkaOptions,
    pub tenants: TenantPoolOptions,
    /// Also decompose events into the `normalized_*` tables.
    pub normalized: bool,
}

/// Consumes the event topic and persists matched events into tenant databases.
pub struct Worker {
    pub db_pool: Arc<DbPool>,
    pub options: WorkerOptions,
}

impl Worker {
    pub async fn new(db_url: &str, db_pool_size: Option<u32>, options: WorkerOptions) -> Result<Self> {
        let db_pool = new_db_pool(db_url, db_pool_size).await?;
        Ok(Self::from_pool(db_pool, options))
    }

    pub fn from_pool(db_pool: Arc<DbPool>, options: WorkerOptions) -> Self {
        Self { db_pool, options }
    }

    pub fn build_matcher(&self) -> Matcher<SingleSlotCache> {
        let control = Arc::new(ControlPlane::new(self.db_pool.clone()));
        let router = Arc::new(TenantRouter::new(control.clone(), self.options.tenants.clone()));
        let delivery = TenantDelivery::new(router, PayloadWriter::new(self.options.normalized));
        Matcher::new(control, Arc::new(delivery), SingleSlotCache::default())
    }

    /// Run until ctrl-c.
    pub async fn run(&self) -> Result<()> {
        ensure_control_plane_schema(&self.db_pool).await?;

        let consumer = EventConsumer::new(&self.options.kafka)?;
        let mut matcher = self.build_matcher();

        tracing::info!(
            topic = %self.options.kafka.topic,
            normalized = self.options.normalized,
            max_tenants = self.options.tenants.max_tenants,
            "Starting consumer"
        );

        tokio::select! {
            _ = consumer.run(&mut matcher) => {}
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Received shutdown signal, stopping consumer");
            }
        }
        Ok(())
    }
}
