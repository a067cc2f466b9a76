pub mod consumer;
pub mod message;
pub mod producer;

use std::time::Duration;

use rdkafka::error::KafkaError;

pub use consumer::EventConsumer;
pub use producer::EventProducer;

pub const DEFAULT_TOPIC: &str = "webhook-payloads";
pub const DEFAULT_GROUP_ID: &str = "webhook-payload-1";
pub const DEFAULT_PRODUCE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct KafkaOptions {
    /// Comma separated `host:port` list.
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
    pub produce_timeout: Duration,
}

impl Default for KafkaOptions {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            produce_timeout: DEFAULT_PRODUCE_TIMEOUT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),
    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("broker did not acknowledge within {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use siphon_trait::RecordHandler;
    use siphon_types::{QueueRecord, WebhookPayload};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use super::*;

    struct Forward(mpsc::UnboundedSender<QueueRecord>);

    #[async_trait]
    impl RecordHandler for Forward {
        async fn handle(&mut self, record: QueueRecord) -> Result<()> {
            self.0.send(record)?;
            Ok(())
        }
    }

    #[tokio::test]
    #[ignore = "requires Kafka"]
    #[serial_test::serial]
    async fn test_batch_round_trip_through_broker() {
        dotenvy::dotenv().ok();
        let options = KafkaOptions {
            brokers: std::env::var("KAFKA_URL").unwrap_or_else(|_| "localhost:9092".to_string()),
            topic: format!("siphon-test-{}", Uuid::new_v4()),
            group_id: format!("siphon-test-{}", Uuid::new_v4()),
            ..Default::default()
        };
        let events = vec![
            WebhookPayload { signature: "sig1".into(), transaction_type: "NFT_SALE".into(), ..Default::default() },
            WebhookPayload { signature: "sig2".into(), transaction_type: "SWAP".into(), ..Default::default() },
        ];

        let producer = EventProducer::new(&options).unwrap();
        producer.send_batch("recv1", &events).await.unwrap();
        producer.close().unwrap();

        let consumer = EventConsumer::new(&options).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handler = Forward(tx);

        let record = tokio::select! {
            _ = consumer.run(&mut handler) => unreachable!("consumer loop never returns"),
            received = tokio::time::timeout(Duration::from_secs(30), rx.recv()) => received.unwrap().unwrap(),
        };

        assert_eq!(record.receiver().as_deref(), Some("recv1"));
        assert!(record.enqueued_at.is_some());
        assert_eq!(record.events().unwrap(), events);
    }
}
