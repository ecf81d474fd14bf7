use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoundId = String;
pub type CandidateId = String;
pub type IdempotencyKey = String;

/// Closed range of comparison values used to bias candidate sampling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueRange {
    pub min: u64,
    pub max: u64,
}

impl ValueRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn overlaps(&self, other: &ValueRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

impl std::str::FromStr for ValueRange {
    type Err = String;

    /// Parses `min-max`, e.g. `1000-9999`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected 'min-max', got '{}'", s))?;
        let min: u64 = min
            .trim()
            .parse()
            .map_err(|_| format!("invalid range minimum '{}'", min))?;
        let max: u64 = max
            .trim()
            .parse()
            .map_err(|_| format!("invalid range maximum '{}'", max))?;
        if min > max {
            return Err(format!("range minimum {} exceeds maximum {}", min, max));
        }
        Ok(Self { min, max })
    }
}

impl std::fmt::Display for ValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

/// An item fetched from the ranked source
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Namespaced name, e.g. `rust-lang/rust`
    pub identifier: CandidateId,
    /// Human-formatted metric ("12.3k"), never shown before a round resolves
    pub display_metric: String,
    pub comparison_value: u64,
    pub description: String,
}

/// Persisted status of a round.
///
/// Stored rounds only ever move `Answerable -> Consumed`; `Expired` is what
/// an answerable round reports once its deadline has passed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    Answerable,
    Consumed,
    Expired,
}

/// Outcome returned for an answer submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreVerdict {
    pub correct: bool,
    pub points: u32,
    pub message: String,
}

/// Written into the round by the submission that consumed it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerRecord {
    pub idempotency_key: IdempotencyKey,
    pub chosen_id: CandidateId,
    pub verdict: ScoreVerdict,
    pub answered_at: DateTime<Utc>,
}

/// Candidate as shown to the player (name + description only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateView {
    pub name: CandidateId,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Round {
    pub id: RoundId,
    /// Both candidates in the order they were shown
    pub candidates: Vec<CandidateView>,
    pub correct_answer_id: CandidateId,
    pub incorrect_answer_id: CandidateId,
    pub correct_value: u64,
    pub incorrect_value: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: RoundStatus,
    #[serde(default)]
    pub answer: Option<AnswerRecord>,
}

impl Round {
    /// Status as of `now`, folding the deadline into the stored status
    pub fn status_at(&self, now: DateTime<Utc>) -> RoundStatus {
        match self.status {
            RoundStatus::Answerable if now > self.expires_at => RoundStatus::Expired,
            status => status,
        }
    }

    /// Whether the record carries everything needed to judge an answer
    pub fn is_well_formed(&self) -> bool {
        !self.correct_answer_id.is_empty()
            && !self.incorrect_answer_id.is_empty()
            && self.correct_answer_id != self.incorrect_answer_id
            && self.candidates.len() == 2
            && self.shows(&self.correct_answer_id)
            && self.shows(&self.incorrect_answer_id)
            && self.correct_value >= self.incorrect_value
    }

    fn shows(&self, id: &str) -> bool {
        self.candidates.iter().any(|c| c.name == id)
    }
}
