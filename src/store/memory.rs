use super::*;
use crate::types::RoundStatus;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process round store
#[derive(Clone, Default)]
pub struct MemoryStore {
    rounds: Arc<RwLock<HashMap<RoundId, Round>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_rounds(rounds: HashMap<RoundId, Round>) -> Self {
        Self {
            rounds: Arc::new(RwLock::new(rounds)),
        }
    }

    pub(crate) async fn snapshot(&self) -> HashMap<RoundId, Round> {
        self.rounds.read().await.clone()
    }

    /// Swap in a whole new set of rounds
    pub(crate) async fn replace(&self, rounds: HashMap<RoundId, Round>) {
        *self.rounds.write().await = rounds;
    }
}

#[async_trait]
impl RoundStore for MemoryStore {
    async fn insert(&self, mut round: Round) -> StoreResult<RoundId> {
        if round.id.is_empty() {
            round.id = ulid::Ulid::new().to_string();
        }
        let id = round.id.clone();

        self.rounds.write().await.insert(id.clone(), round);
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Round>> {
        Ok(self.rounds.read().await.get(id).cloned())
    }

    async fn consume(&self, id: &str, answer: AnswerRecord) -> StoreResult<ConsumeOutcome> {
        let mut rounds = self.rounds.write().await;
        let Some(round) = rounds.get_mut(id) else {
            return Ok(ConsumeOutcome::Missing);
        };

        if round.status == RoundStatus::Consumed {
            return Ok(match &round.answer {
                Some(existing) => ConsumeOutcome::AlreadyConsumed(existing.clone()),
                // Consumed without a record only happens to hand-edited data
                None => ConsumeOutcome::Missing,
            });
        }

        round.status = RoundStatus::Consumed;
        round.answer = Some(answer);
        Ok(ConsumeOutcome::Consumed)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let mut rounds = self.rounds.write().await;
        let before = rounds.len();
        rounds.retain(|_, round| round.expires_at >= cutoff);
        Ok(before - rounds.len())
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.rounds.read().await.len())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{CandidateView, ScoreVerdict};

    pub(crate) fn round_at(id: &str, created_at: DateTime<Utc>) -> Round {
        Round {
            id: id.to_string(),
            candidates: vec![
                CandidateView {
                    name: "a/alpha".to_string(),
                    description: String::new(),
                },
                CandidateView {
                    name: "b/beta".to_string(),
                    description: String::new(),
                },
            ],
            correct_answer_id: "a/alpha".to_string(),
            incorrect_answer_id: "b/beta".to_string(),
            correct_value: 5000,
            incorrect_value: 3000,
            created_at,
            expires_at: created_at + chrono::Duration::seconds(30),
            status: RoundStatus::Answerable,
            answer: None,
        }
    }

    pub(crate) fn answer(key: &str) -> AnswerRecord {
        AnswerRecord {
            idempotency_key: key.to_string(),
            chosen_id: "a/alpha".to_string(),
            verdict: ScoreVerdict {
                correct: true,
                points: 50,
                message: "ok".to_string(),
            },
            answered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryStore::new();
        let id = store.insert(round_at("", Utc::now())).await.unwrap();

        assert!(!id.is_empty());
        assert!(ulid::Ulid::from_string(&id).is_ok());
        let stored = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
    }

    #[tokio::test]
    async fn test_insert_keeps_supplied_id() {
        let store = MemoryStore::new();
        let round = round_at("given", Utc::now());
        let id = store.insert(round.clone()).await.unwrap();

        assert_eq!(id, "given");
        assert_eq!(store.find_by_id("given").await.unwrap(), Some(round));
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = MemoryStore::new();
        assert!(store.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_ignores_expiry() {
        let store = MemoryStore::new();
        let old = Utc::now() - chrono::Duration::hours(1);
        store.insert(round_at("old", old)).await.unwrap();

        assert!(store.find_by_id("old").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_consume_once() {
        let store = MemoryStore::new();
        store.insert(round_at("r1", Utc::now())).await.unwrap();

        let first = store.consume("r1", answer("k1")).await.unwrap();
        assert_eq!(first, ConsumeOutcome::Consumed);

        let second = store.consume("r1", answer("k2")).await.unwrap();
        match second {
            ConsumeOutcome::AlreadyConsumed(existing) => {
                assert_eq!(existing.idempotency_key, "k1")
            }
            other => panic!("expected AlreadyConsumed, got {:?}", other),
        }

        let stored = store.find_by_id("r1").await.unwrap().unwrap();
        assert_eq!(stored.status, RoundStatus::Consumed);
        assert_eq!(stored.answer.unwrap().idempotency_key, "k1");
    }

    #[tokio::test]
    async fn test_consume_missing() {
        let store = MemoryStore::new();
        assert_eq!(
            store.consume("nope", answer("k1")).await.unwrap(),
            ConsumeOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_concurrent_consume_has_one_winner() {
        let store = MemoryStore::new();
        store.insert(round_at("r1", Utc::now())).await.unwrap();

        let attempts = (0..16).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.consume("r1", answer(&format!("k{}", i))).await })
        });

        let outcomes: Vec<_> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        let winners = outcomes
            .iter()
            .filter(|o| **o == ConsumeOutcome::Consumed)
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_do_not_interfere() {
        let store = MemoryStore::new();

        let inserts = (0..32).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.insert(round_at("", Utc::now())).await })
        });

        let ids: std::collections::HashSet<_> = futures::future::join_all(inserts)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(ids.len(), 32);
        assert_eq!(store.len().await.unwrap(), 32);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert(round_at("stale", now - chrono::Duration::minutes(5)))
            .await
            .unwrap();
        store.insert(round_at("fresh", now)).await.unwrap();

        let purged = store.purge_expired(now).await.unwrap();

        assert_eq!(purged, 1);
        assert!(store.find_by_id("stale").await.unwrap().is_none());
        assert!(store.find_by_id("fresh").await.unwrap().is_some());
    }
}
