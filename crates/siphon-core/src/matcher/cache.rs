use std::sync::Arc;

use siphon_types::{IndexingStrategy, SubscriptionLookupModel};

pub type Candidates = Arc<Vec<SubscriptionLookupModel>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub strategy: IndexingStrategy,
    pub receiver: String,
}

impl CacheKey {
    pub fn new(strategy: IndexingStrategy, receiver: &str) -> Self {
        Self { strategy, receiver: receiver.to_string() }
    }
}

/// Memo of candidate lookup rows, scoped to a single queue record.
///
/// Implementations only change how often the control plane is queried, never which
/// subscribers an event matches.
pub trait CandidateCache: Send {
    fn get(&self, key: &CacheKey) -> Option<Candidates>;
    fn put(&mut self, key: CacheKey, candidates: Candidates);
    fn clear(&mut self);
}

/// Remembers the most recent fetch. Consecutive events of the same strategy within a
/// batch reuse it.
#[derive(Debug, Default)]
pub struct SingleSlotCache {
    slot: Option<(CacheKey, Candidates)>,
}

impl CandidateCache for SingleSlotCache {
    fn get(&self, key: &CacheKey) -> Option<Candidates> {
        match &self.slot {
            Some((cached, candidates)) if cached == key => Some(candidates.clone()),
            _ => None,
        }
    }

    fn put(&mut self, key: CacheKey, candidates: Candidates) {
        self.slot = Some((key, candidates));
    }

    fn clear(&mut self) {
        self.slot = None;
    }
}

/// Always misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl CandidateCache for NoCache {
    fn get(&self, _key: &CacheKey) -> Option<Candidates> {
        None
    }

    fn put(&mut self, _key: CacheKey, _candidates: Candidates) {}

    fn clear(&mut self) {}
}
