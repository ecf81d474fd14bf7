mod file;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{AnswerRecord, Round, RoundId};

pub use file::{FileStore, StoreSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use memory::MemoryStore;

#[cfg(test)]
pub(crate) use memory::tests as fixtures;

/// Result type for round store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("round store unavailable: {0}")]
    Unavailable(String),

    #[error("round store data is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Result of trying to move a round from answerable to consumed
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    /// This call consumed the round
    Consumed,
    /// An earlier submission already consumed it
    AlreadyConsumed(AnswerRecord),
    Missing,
}

/// Durable map of rounds keyed by id.
///
/// The store applies no expiry policy of its own; `find_by_id` returns
/// whatever was stored.
#[async_trait]
pub trait RoundStore: Send + Sync {
    /// Persist a round, assigning a fresh id when `round.id` is empty.
    /// Returns the id the round is stored under.
    async fn insert(&self, round: Round) -> StoreResult<RoundId>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Round>>;

    /// Atomically mark an answerable round consumed by `answer`
    async fn consume(&self, id: &str, answer: AnswerRecord) -> StoreResult<ConsumeOutcome>;

    /// Drop rounds that expired before `cutoff`, returning how many went
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;

    async fn len(&self) -> StoreResult<usize>;
}
