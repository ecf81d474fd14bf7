use super::*;
use crate::config::{DEFAULT_CORRECT_MESSAGES, GENERIC_LOSS_MESSAGE};
use crate::types::{AnswerRecord, Round, ScoreVerdict};
use rand::seq::IndexedRandom;

/// Verdict for anything that cannot be judged: unknown, expired, malformed
/// or already consumed rounds
pub fn generic_loss() -> ScoreVerdict {
    ScoreVerdict {
        correct: false,
        points: 0,
        message: GENERIC_LOSS_MESSAGE.to_string(),
    }
}

/// Fill `{winner}`, `{loser}`, `{correct}` and `{incorrect}` from a round
pub fn render_message(template: &str, round: &Round) -> String {
    template
        .replace("{winner}", &round.correct_answer_id)
        .replace("{loser}", &round.incorrect_answer_id)
        .replace("{correct}", &round.correct_value.to_string())
        .replace("{incorrect}", &round.incorrect_value.to_string())
}

/// Cached verdict for a retry carrying the consuming key, loss for anyone else
pub(crate) fn replay(existing: Option<&AnswerRecord>, key: &str) -> ScoreVerdict {
    match existing {
        Some(record) if record.idempotency_key == key => record.verdict.clone(),
        _ => generic_loss(),
    }
}

impl RoundEngine {
    /// Score `chosen_id` against a well-formed round
    pub(crate) fn judge(&self, round: &Round, chosen_id: &str) -> ScoreVerdict {
        if chosen_id == round.correct_answer_id {
            let template = self
                .config
                .correct_messages
                .choose(&mut rand::rng())
                .map(String::as_str)
                .unwrap_or(DEFAULT_CORRECT_MESSAGES[0]);

            ScoreVerdict {
                correct: true,
                points: self.config.reward_points,
                message: render_message(template, round),
            }
        } else {
            ScoreVerdict {
                correct: false,
                points: 0,
                message: render_message(&self.config.incorrect_message, round),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{engine_with, StubSource};
    use crate::store::fixtures::round_at;
    use chrono::Utc;

    #[test]
    fn test_render_message() {
        let round = round_at("r1", Utc::now());
        assert_eq!(
            render_message("{winner} {correct} > {loser} {incorrect}", &round),
            "a/alpha 5000 > b/beta 3000"
        );
    }

    #[test]
    fn test_every_correct_message_reveals_values() {
        let round = round_at("r1", Utc::now());
        for template in DEFAULT_CORRECT_MESSAGES {
            let message = render_message(template, &round);
            assert!(message.contains("5000"), "{}", message);
            assert!(message.contains("3000"), "{}", message);
            assert!(!message.contains('{'), "{}", message);
        }
    }

    #[test]
    fn test_judge() {
        let (engine, _) = engine_with(StubSource::with_pool(Vec::new()));
        let round = round_at("r1", Utc::now());

        let right = engine.judge(&round, "a/alpha");
        assert!(right.correct);
        assert_eq!(right.points, 50);

        let wrong = engine.judge(&round, "b/beta");
        assert!(!wrong.correct);
        assert_eq!(wrong.points, 0);
        assert!(wrong.message.contains("5000"));
        assert!(wrong.message.contains("3000"));
    }

    #[test]
    fn test_replay() {
        let record = AnswerRecord {
            idempotency_key: "k1".to_string(),
            chosen_id: "a/alpha".to_string(),
            verdict: ScoreVerdict {
                correct: true,
                points: 50,
                message: "cached".to_string(),
            },
            answered_at: Utc::now(),
        };

        assert_eq!(replay(Some(&record), "k1").message, "cached");
        assert_eq!(replay(Some(&record), "k2"), generic_loss());
        assert_eq!(replay(None, "k1"), generic_loss());
    }
}
