use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    error::KafkaError,
};
#[cfg(test)]
use mockall::automock;
use siphon_trait::RecordHandler;
use siphon_types::QueueRecord;

use super::{message::record_from_message, KafkaOptions, QueueError};

/// Records how far a partition has been consumed.
#[cfg_attr(test, automock)]
pub trait OffsetStore {
    /// `next_offset` is the offset of the next record to read.
    fn store(&self, partition: i32, next_offset: i64) -> Result<(), KafkaError>;
}

pub struct EventConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl EventConsumer {
    pub fn new(options: &KafkaOptions) -> Result<Self, QueueError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &options.brokers)
            .set("group.id", &options.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .set("session.timeout.ms", "6000")
            .create()?;
        consumer.subscribe(&[options.topic.as_str()])?;

        tracing::info!(
            brokers = %options.brokers,
            topic = %options.topic,
            group_id = %options.group_id,
            "Kafka consumer subscribed"
        );
        Ok(Self { consumer, topic: options.topic.clone() })
    }

    /// Pull records forever, handing them to `handler` one at a time in partition order.
    pub async fn run<H: RecordHandler + ?Sized>(&self, handler: &mut H) {
        loop {
            // the borrowed message is released before the handler runs
            let received = self.consumer.recv().await.map(|msg| record_from_message(&msg));
            consume(received, handler, self).await;
        }
    }
}

impl OffsetStore for EventConsumer {
    fn store(&self, partition: i32, next_offset: i64) -> Result<(), KafkaError> {
        self.consumer.store_offset(&self.topic, partition, next_offset)
    }
}

/// One step of the poll loop.
///
/// A record is marked consumed once the handler returns, whatever the outcome:
/// handler errors and broker errors are logged and the loop moves on.
pub async fn consume<H, S>(received: Result<QueueRecord, KafkaError>, handler: &mut H, offsets: &S)
where
    H: RecordHandler + ?Sized,
    S: OffsetStore + ?Sized,
{
    let record = match received {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(error = %e, "Error receiving record");
            return;
        }
    };

    let (partition, offset) = (record.partition, record.offset);
    if let Err(e) = handler.handle(record).await {
        tracing::error!(partition, offset, error = %e, "Failed to handle record");
    }

    if let Err(e) = offsets.store(partition, offset + 1) {
        tracing::warn!(partition, offset, error = %e, "Failed to store offset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use mockall::{predicate::eq, Sequence};
    use rdkafka::types::RDKafkaErrorCode;
    use siphon_trait::MockRecordHandler;

    fn record(partition: i32, offset: i64) -> QueueRecord {
        QueueRecord {
            key: Some(b"recv1".to_vec()),
            payload: b"[]".to_vec(),
            receiver_header: None,
            enqueued_at: None,
            partition,
            offset,
        }
    }

    fn fetch_error() -> KafkaError {
        KafkaError::MessageConsumption(RDKafkaErrorCode::BrokerTransportFailure)
    }

    #[tokio::test]
    async fn test_records_are_handled_then_stored_in_order() {
        let mut seq = Sequence::new();
        let mut handler = MockRecordHandler::new();
        let mut offsets = MockOffsetStore::new();

        for (offset, ok) in [(7, true), (8, false), (9, true)] {
            handler
                .expect_handle()
                .withf(move |r| r.offset == offset)
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| if ok { Ok(()) } else { Err(anyhow!("tenant unreachable")) });
            offsets
                .expect_store()
                .with(eq(2), eq(offset + 1))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let polled = vec![Ok(record(2, 7)), Err(fetch_error()), Ok(record(2, 8)), Ok(record(2, 9))];
        for received in polled {
            consume(received, &mut handler, &offsets).await;
        }
    }

    #[tokio::test]
    async fn test_fetch_error_touches_nothing() {
        let mut handler = MockRecordHandler::new();
        handler.expect_handle().times(0);
        let mut offsets = MockOffsetStore::new();
        offsets.expect_store().times(0);

        consume(Err(fetch_error()), &mut handler, &offsets).await;
    }

    #[tokio::test]
    async fn test_offset_store_failure_does_not_stop_the_loop() {
        let mut handler = MockRecordHandler::new();
        handler.expect_handle().times(2).returning(|_| Ok(()));
        let mut offsets = MockOffsetStore::new();
        offsets
            .expect_store()
            .times(2)
            .returning(|_, _| Err(KafkaError::StoreOffset(RDKafkaErrorCode::UnknownPartition)));

        consume(Ok(record(0, 1)), &mut handler, &offsets).await;
        consume(Ok(record(0, 2)), &mut handler, &offsets).await;
    }
}
