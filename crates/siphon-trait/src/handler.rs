use anyhow::Result;
use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use siphon_types::QueueRecord;

/// Consumes records pulled off the queue, one at a time and in order.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait RecordHandler: Send {
    async fn handle(&mut self, record: QueueRecord) -> Result<()>;
}
