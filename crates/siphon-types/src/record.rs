use chrono::{DateTime, Utc};

use crate::EventBatch;

pub const RECEIVER_HEADER: &str = "receiver";
pub const TIMESTAMP_HEADER: &str = "timestamp";

/// A queue record as seen by the matching stage: key, raw JSON value and the two
/// headers attached by the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRecord {
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
    pub receiver_header: Option<String>,
    pub enqueued_at: Option<DateTime<Utc>>,
    pub partition: i32,
    pub offset: i64,
}

impl QueueRecord {
    /// Receiver name the batch was published under. The key is authoritative; the
    /// header is only consulted for records produced without one.
    pub fn receiver(&self) -> Option<String> {
        match &self.key {
            Some(key) if !key.is_empty() => Some(String::from_utf8_lossy(key).into_owned()),
            _ => self.receiver_header.clone().filter(|r| !r.is_empty()),
        }
    }

    pub fn events(&self) -> serde_json::Result<EventBatch> {
        serde_json::from_slice(&self.payload)
    }
}
