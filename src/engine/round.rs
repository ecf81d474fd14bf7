use super::*;
use crate::protocol::RoundPublicView;
use crate::types::*;
use chrono::{DateTime, Utc};
use rand::seq::{index, IndexedRandom};
use rand::Rng;
use std::collections::HashSet;

impl RoundEngine {
    /// Create a new round
    pub async fn create_round(&self) -> EngineResult<RoundPublicView> {
        self.create_round_at(Utc::now()).await
    }

    pub async fn create_round_at(&self, now: DateTime<Utc>) -> EngineResult<RoundPublicView> {
        let range = self.sample_range().ok_or_else(|| {
            EngineError::CandidateUnavailable(SourceError::Malformed(
                "no value ranges configured".to_string(),
            ))
        })?;

        let pool = self
            .source
            .fetch_candidate_pool(range)
            .await
            .inspect_err(|e| {
                tracing::warn!(source = self.source.name(), range = %range, "Candidate fetch failed: {}", e)
            })?;

        let (first, second) = pick_pair(&pool, &mut rand::rng()).ok_or_else(|| {
            tracing::warn!(range = %range, pool = pool.len(), "Candidate pool too small");
            SourceError::Malformed(format!(
                "need 2 distinct candidates in {}, got {} items",
                range,
                pool.len()
            ))
        })?;

        // Ties go to whichever candidate was sampled first
        let (winner, loser) = if second.comparison_value > first.comparison_value {
            (second, first)
        } else {
            (first, second)
        };

        let mut round = Round {
            id: ulid::Ulid::new().to_string(),
            candidates: [first, second]
                .iter()
                .map(|c| CandidateView {
                    name: c.identifier.clone(),
                    description: c.description.clone(),
                })
                .collect(),
            correct_answer_id: winner.identifier.clone(),
            incorrect_answer_id: loser.identifier.clone(),
            correct_value: winner.comparison_value,
            incorrect_value: loser.comparison_value,
            created_at: now,
            expires_at: self.deadline_from(now),
            status: RoundStatus::Answerable,
            answer: None,
        };

        round.id = self.store.insert(round.clone()).await?;

        tracing::info!(
            round_id = %round.id,
            range = %range,
            left = %first.identifier,
            left_stars = %first.display_metric,
            right = %second.identifier,
            right_stars = %second.display_metric,
            "Round created"
        );

        Ok(RoundPublicView::from(&round))
    }

    /// End of the answer window opened at `now`; saturates instead of overflowing
    fn deadline_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.config.round_duration)
            .ok()
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Uniformly pick one configured value range
    fn sample_range(&self) -> Option<ValueRange> {
        self.config.value_ranges.choose(&mut rand::rng()).copied()
    }
}

/// Sample two distinct candidates (by identifier) without replacement.
///
/// Returns them in sampling order, or `None` when the pool holds fewer than
/// two distinct identifiers.
pub fn pick_pair<'a, R: Rng + ?Sized>(
    pool: &'a [Candidate],
    rng: &mut R,
) -> Option<(&'a Candidate, &'a Candidate)> {
    let mut seen = HashSet::new();
    let distinct: Vec<&Candidate> = pool
        .iter()
        .filter(|c| seen.insert(c.identifier.as_str()))
        .collect();

    if distinct.len() < 2 {
        return None;
    }

    let picked = index::sample(rng, distinct.len(), 2);
    Some((distinct[picked.index(0)], distinct[picked.index(1)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{candidate, engine_with, StubSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pick_pair_is_distinct() {
        let pool = vec![
            candidate("a/a", 10),
            candidate("a/a", 10),
            candidate("b/b", 20),
            candidate("c/c", 30),
        ];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let (first, second) = pick_pair(&pool, &mut rng).unwrap();
            assert_ne!(first.identifier, second.identifier);
        }
    }

    #[test]
    fn test_pick_pair_needs_two_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_pair(&[], &mut rng).is_none());
        assert!(pick_pair(&[candidate("a/a", 1)], &mut rng).is_none());
        assert!(pick_pair(&[candidate("a/a", 1), candidate("a/a", 2)], &mut rng).is_none());
    }

    #[test]
    fn test_pick_pair_covers_pool() {
        let pool: Vec<_> = (0..5).map(|i| candidate(&format!("o/r{}", i), i)).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();

        for _ in 0..500 {
            let (first, second) = pick_pair(&pool, &mut rng).unwrap();
            seen.insert(first.identifier.clone());
            seen.insert(second.identifier.clone());
        }
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_created_round_hides_values_and_names_winner() {
        let (engine, _) = engine_with(StubSource::with_pool(vec![
            candidate("a/alpha", 5000),
            candidate("b/beta", 3000),
        ]));
        let now = Utc::now();

        let view = engine.create_round_at(now).await.unwrap();
        assert_eq!(view.countdown_duration_ms, 30_000);
        assert_eq!(view.candidates.len(), 2);

        let round = engine.store().find_by_id(&view.id).await.unwrap().unwrap();
        assert_eq!(round.correct_answer_id, "a/alpha");
        assert_eq!(round.incorrect_answer_id, "b/beta");
        assert_eq!(round.correct_value, 5000);
        assert_eq!(round.incorrect_value, 3000);
        assert_eq!(round.expires_at - round.created_at, chrono::Duration::seconds(30));
        assert_eq!(round.status, RoundStatus::Answerable);
        assert!(round.is_well_formed());
    }

    #[tokio::test]
    async fn test_correct_answer_is_shown_and_not_lower() {
        let pool: Vec<_> = (0..10)
            .map(|i| candidate(&format!("o/r{}", i), (i * 37 % 11) as u64 * 100))
            .collect();
        let (engine, _) = engine_with(StubSource::with_pool(pool));

        for _ in 0..50 {
            let view = engine.create_round().await.unwrap();
            let round = engine.store().find_by_id(&view.id).await.unwrap().unwrap();

            let shown: Vec<_> = view.candidates.iter().map(|c| c.name.as_str()).collect();
            assert!(shown.contains(&round.correct_answer_id.as_str()));
            assert!(shown.contains(&round.incorrect_answer_id.as_str()));
            assert!(round.correct_value >= round.incorrect_value);
        }
    }

    #[tokio::test]
    async fn test_tie_goes_to_first_shown() {
        let (engine, _) = engine_with(StubSource::with_pool(vec![
            candidate("a/alpha", 4242),
            candidate("b/beta", 4242),
        ]));

        for _ in 0..20 {
            let view = engine.create_round().await.unwrap();
            let round = engine.store().find_by_id(&view.id).await.unwrap().unwrap();
            assert_eq!(round.correct_answer_id, view.candidates[0].name);
            assert_eq!(round.incorrect_answer_id, view.candidates[1].name);
        }
    }

    #[tokio::test]
    async fn test_huge_round_duration_saturates() {
        let (engine, _) = engine_with(StubSource::with_pool(vec![
            candidate("a/alpha", 5000),
            candidate("b/beta", 3000),
        ]));
        let engine = RoundEngine {
            config: GameConfig {
                round_duration: std::time::Duration::from_secs(1 << 50),
                ..GameConfig::default()
            },
            ..engine
        };
        let now = Utc::now();

        let view = engine.create_round_at(now).await.unwrap();
        let round = engine.store().find_by_id(&view.id).await.unwrap().unwrap();

        assert!(round.expires_at > now);
        assert!(view.countdown_duration_ms > 0);
        assert_eq!(round.status_at(now), RoundStatus::Answerable);

        let verdict = engine
            .submit_answer_at(&view.id, "a/alpha", None, now)
            .await
            .unwrap();
        assert!(verdict.correct);
    }

    #[tokio::test]
    async fn test_small_pool_is_candidate_unavailable() {
        let (engine, _) = engine_with(StubSource::with_pool(vec![
            candidate("a/alpha", 1),
            candidate("a/alpha", 2),
        ]));

        let err = engine.create_round().await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::CandidateUnavailable(SourceError::Malformed(_))
        ));
        assert_eq!(engine.store().len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_source_failure_is_candidate_unavailable() {
        let (engine, _) = engine_with(StubSource::failing(503));

        let err = engine.create_round().await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::CandidateUnavailable(SourceError::Unavailable {
                status: Some(503),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_samples_configured_ranges() {
        let (engine, source) = engine_with(StubSource::with_pool(vec![
            candidate("a/alpha", 2),
            candidate("b/beta", 1),
        ]));

        for _ in 0..30 {
            engine.create_round().await.unwrap();
        }

        let requested = source.requested_ranges();
        assert_eq!(requested.len(), 30);
        assert!(requested
            .iter()
            .all(|r| engine.config().value_ranges.contains(r)));
    }
}
