pub mod cache;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use siphon_trait::{RecordHandler, SubscriptionSource, TenantSink};
use siphon_types::{
    IndexingStrategy, QueueRecord, SubscriptionLookupModel, WebhookPayload, WriteOutcome,
};

pub use cache::{CacheKey, CandidateCache, Candidates, NoCache, SingleSlotCache};

/// Tally of what happened to one record's events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub events: usize,
    pub unclassified: usize,
    /// Events dropped because their candidates could not be fetched.
    pub lookup_failures: usize,
    pub matches: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub delivery_failures: usize,
}

/// Pairs events with the subscribers interested in them and hands each pair to the sink.
pub struct Matcher<C: CandidateCache = SingleSlotCache> {
    source: Arc<dyn SubscriptionSource>,
    sink: Arc<dyn TenantSink>,
    cache: C,
}

impl<C: CandidateCache> Matcher<C> {
    pub fn new(source: Arc<dyn SubscriptionSource>, sink: Arc<dyn TenantSink>, cache: C) -> Self {
        Self { source, sink, cache }
    }

    /// Process one record's events in order. The candidate cache lives for this call only.
    pub async fn process_batch(&mut self, receiver: &str, events: &[WebhookPayload]) -> BatchReport {
        self.cache.clear();
        let mut report = BatchReport { events: events.len(), ..Default::default() };

        for event in events {
            self.process_event(receiver, event, &mut report).await;
        }

        self.cache.clear();
        report
    }

    async fn process_event(&mut self, receiver: &str, event: &WebhookPayload, report: &mut BatchReport) {
        let Some(strategy) = IndexingStrategy::classify(&event.transaction_type) else {
            tracing::debug!(
                signature = %event.signature,
                event_type = %event.transaction_type,
                "Skipping unclassified event"
            );
            report.unclassified += 1;
            return;
        };

        let candidates = match self.candidates(strategy, receiver).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(
                    signature = %event.signature,
                    %strategy,
                    receiver,
                    error = %e,
                    "Failed to fetch subscription candidates"
                );
                report.lookup_failures += 1;
                return;
            }
        };

        for target in matching_subscribers(&candidates, event) {
            report.matches += 1;
            match self.sink.deliver(target, event).await {
                Ok(WriteOutcome::Inserted) => {
                    tracing::info!(
                        signature = %event.signature,
                        user_id = %target.user_id,
                        table = %target.table_name,
                        "Event persisted"
                    );
                    report.inserted += 1;
                }
                Ok(WriteOutcome::Duplicate) => {
                    tracing::info!(
                        signature = %event.signature,
                        user_id = %target.user_id,
                        table = %target.table_name,
                        "Event already persisted"
                    );
                    report.duplicates += 1;
                }
                Err(e) => {
                    tracing::error!(
                        signature = %event.signature,
                        user_id = %target.user_id,
                        table = %target.table_name,
                        error = %e,
                        "Failed to persist event"
                    );
                    report.delivery_failures += 1;
                }
            }
        }
    }

    async fn candidates(&mut self, strategy: IndexingStrategy, receiver: &str) -> Result<Candidates> {
        let key = CacheKey::new(strategy, receiver);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let rows = Arc::new(self.source.lookups_for(strategy, receiver).await?);
        self.cache.put(key, rows.clone());
        Ok(rows)
    }
}

/// Lookup rows whose token address the event touches, in candidate order.
pub fn matching_subscribers<'a>(
    candidates: &'a [SubscriptionLookupModel],
    event: &WebhookPayload,
) -> Vec<&'a SubscriptionLookupModel> {
    let addresses = event.addresses();
    candidates.iter().filter(|row| addresses.contains(row.token_address.as_str())).collect()
}

#[async_trait]
impl<C: CandidateCache> RecordHandler for Matcher<C> {
    async fn handle(&mut self, record: QueueRecord) -> Result<()> {
        let receiver = record
            .receiver()
            .ok_or_else(|| anyhow!("record at offset {} carries no receiver", record.offset))?;
        let events = record
            .events()
            .with_context(|| format!("undecodable batch at offset {}", record.offset))?;

        let report = self.process_batch(&receiver, &events).await;
        tracing::info!(
            receiver = %receiver,
            partition = record.partition,
            offset = record.offset,
            events = report.events,
            matches = report.matches,
            inserted = report.inserted,
            duplicates = report.duplicates,
            failures = report.delivery_failures + report.lookup_failures,
            "Record processed"
        );
        Ok(())
    }
}
