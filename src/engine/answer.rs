use super::verdict::replay;
use super::*;
use crate::store::ConsumeOutcome;
use crate::types::*;
use chrono::{DateTime, Utc};

impl RoundEngine {
    /// Judge an answer for a round.
    ///
    /// Unknown, malformed, expired and already-consumed rounds all resolve to
    /// the generic loss verdict; only store failures are errors. A retry
    /// carrying the idempotency key that consumed the round gets the original
    /// verdict back.
    pub async fn submit_answer(
        &self,
        round_id: &str,
        chosen_id: &str,
        idempotency_key: Option<IdempotencyKey>,
    ) -> EngineResult<ScoreVerdict> {
        self.submit_answer_at(round_id, chosen_id, idempotency_key, Utc::now())
            .await
    }

    pub async fn submit_answer_at(
        &self,
        round_id: &str,
        chosen_id: &str,
        idempotency_key: Option<IdempotencyKey>,
        now: DateTime<Utc>,
    ) -> EngineResult<ScoreVerdict> {
        // A keyless submission still gets a key so it can only score once
        let key = idempotency_key
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| ulid::Ulid::new().to_string());

        let Some(round) = self.store.find_by_id(round_id).await? else {
            tracing::debug!(round_id, "Answer for unknown round");
            return Ok(generic_loss());
        };

        if !round.is_well_formed() {
            tracing::warn!(round_id, "Stored round is missing answer data");
            return Ok(generic_loss());
        }

        match round.status_at(now) {
            RoundStatus::Consumed => {
                tracing::debug!(round_id, "Answer for consumed round");
                return Ok(replay(round.answer.as_ref(), &key));
            }
            RoundStatus::Expired => {
                tracing::debug!(round_id, expired_at = %round.expires_at, "Answer after expiry");
                return Ok(generic_loss());
            }
            RoundStatus::Answerable => {}
        }

        let verdict = self.judge(&round, chosen_id);
        let record = AnswerRecord {
            idempotency_key: key.clone(),
            chosen_id: chosen_id.to_string(),
            verdict: verdict.clone(),
            answered_at: now,
        };

        match self.store.consume(round_id, record).await? {
            ConsumeOutcome::Consumed => {
                tracing::info!(
                    round_id,
                    correct = verdict.correct,
                    points = verdict.points,
                    "Round answered"
                );
                Ok(verdict)
            }
            // Lost the race to a concurrent submission
            ConsumeOutcome::AlreadyConsumed(existing) => Ok(replay(Some(&existing), &key)),
            ConsumeOutcome::Missing => Ok(generic_loss()),
        }
    }
}
