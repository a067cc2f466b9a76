use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use siphon_trait::TenantSink;
use siphon_types::{SubscriptionLookupModel, TableName, WebhookPayload, WriteOutcome};

use crate::{tenant::TenantRouter, writer::PayloadWriter};

/// Routes a matched event to its subscriber's database and writes it there.
pub struct TenantDelivery {
    router: Arc<TenantRouter>,
    writer: PayloadWriter,
}

impl TenantDelivery {
    pub fn new(router: Arc<TenantRouter>, writer: PayloadWriter) -> Self {
        Self { router, writer }
    }
}

#[async_trait]
impl TenantSink for TenantDelivery {
    async fn deliver(
        &self,
        target: &SubscriptionLookupModel,
        payload: &WebhookPayload,
    ) -> Result<WriteOutcome> {
        // rejected before any connection is taken
        let table = TableName::parse(&target.table_name)?;
        let mut conn = self.router.acquire(&target.user_id).await?;
        self.writer.write(&mut conn, &table, payload).await
    }
}
