use chrono::{DateTime, SecondsFormat, Utc};
use rdkafka::message::{Header, Headers, Message, OwnedHeaders};
use siphon_types::{
    record::{RECEIVER_HEADER, TIMESTAMP_HEADER},
    QueueRecord, WebhookPayload,
};

use super::QueueError;

pub fn encode_batch(events: &[WebhookPayload]) -> Result<Vec<u8>, QueueError> {
    Ok(serde_json::to_vec(events)?)
}

pub fn batch_headers(receiver: &str, enqueued_at: DateTime<Utc>) -> OwnedHeaders {
    let timestamp = enqueued_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    OwnedHeaders::new()
        .insert(Header { key: RECEIVER_HEADER, value: Some(receiver) })
        .insert(Header { key: TIMESTAMP_HEADER, value: Some(timestamp.as_str()) })
}

/// Lift a broker message into the record the matcher works with. Unknown headers are
/// ignored, a malformed timestamp header is dropped.
pub fn record_from_message<M: Message>(msg: &M) -> QueueRecord {
    let mut receiver_header = None;
    let mut enqueued_at = None;

    if let Some(headers) = msg.headers() {
        for i in 0..headers.count() {
            let header = headers.get(i);
            let Some(value) = header.value else { continue };
            let value = String::from_utf8_lossy(value);
            match header.key {
                RECEIVER_HEADER => receiver_header = Some(value.into_owned()),
                TIMESTAMP_HEADER => {
                    enqueued_at = DateTime::parse_from_rfc3339(&value)
                        .map(|ts| ts.with_timezone(&Utc))
                        .ok()
                }
                _ => {}
            }
        }
    }

    QueueRecord {
        key: msg.key().map(<[u8]>::to_vec),
        payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        receiver_header,
        enqueued_at,
        partition: msg.partition(),
        offset: msg.offset(),
    }
}
