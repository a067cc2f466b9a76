use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord, Producer},
    util::Timeout,
};
use siphon_trait::EventPublisher;
use siphon_types::WebhookPayload;

use super::{
    message::{batch_headers, encode_batch},
    KafkaOptions, QueueError,
};

/// Publishes each received batch as a single record keyed by receiver name, so every
/// batch of one receiver lands on the same partition.
pub struct EventProducer {
    producer: FutureProducer,
    topic: String,
    options: KafkaOptions,
}

impl EventProducer {
    pub fn new(options: &KafkaOptions) -> Result<Self, QueueError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &options.brokers)
            .set("acks", "all")
            .set("compression.type", "snappy")
            .set("message.timeout.ms", options.produce_timeout.as_millis().to_string())
            .create()?;

        tracing::info!(brokers = %options.brokers, topic = %options.topic, "Kafka producer created");
        Ok(Self { producer, topic: options.topic.clone(), options: options.clone() })
    }

    pub async fn send_batch(&self, receiver: &str, events: &[WebhookPayload]) -> Result<(), QueueError> {
        let payload = encode_batch(events)?;
        let headers = batch_headers(receiver, Utc::now());
        let record = FutureRecord::to(&self.topic).key(receiver).payload(&payload).headers(headers);

        let budget = self.options.produce_timeout;
        // the timeout passed to `send` only bounds local enqueueing
        let sent = tokio::time::timeout(budget, self.producer.send(record, Timeout::After(budget))).await;

        match sent {
            Ok(Ok(delivery)) => {
                tracing::debug!(receiver, events = events.len(), ?delivery, "Batch enqueued");
                Ok(())
            }
            Ok(Err((err, _))) => {
                tracing::error!(receiver, events = events.len(), error = %err, "Failed to enqueue batch");
                Err(err.into())
            }
            Err(_) => {
                tracing::error!(receiver, events = events.len(), ?budget, "Batch not acknowledged in time");
                Err(QueueError::Timeout(budget))
            }
        }
    }

    /// Wait for in-flight records before shutdown.
    pub fn close(&self) -> Result<(), QueueError> {
        self.producer.flush(Timeout::After(self.options.produce_timeout))?;
        tracing::info!(topic = %self.topic, "Kafka producer flushed");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for EventProducer {
    async fn publish(&self, receiver: &str, events: &[WebhookPayload]) -> Result<()> {
        self.send_batch(receiver, events).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[tokio::test]
    async fn test_send_batch_is_bounded_by_produce_timeout() {
        let options = KafkaOptions {
            // nothing listens here
            brokers: "127.0.0.1:1".to_string(),
            produce_timeout: Duration::from_millis(300),
            ..Default::default()
        };
        let producer = EventProducer::new(&options).unwrap();
        let events = vec![WebhookPayload { signature: "sig1".into(), ..Default::default() }];

        let started = Instant::now();
        let result = producer.send_batch("recv1", &events).await;

        assert!(matches!(result, Err(QueueError::Timeout(_)) | Err(QueueError::Kafka(_))));
        assert!(started.elapsed() < Duration::from_millis(900), "took {:?}", started.elapsed());
    }
}
