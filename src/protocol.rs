//! Wire types shared by the HTTP API and the game client.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Header carrying the client's idempotency token for a submission
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

/// Public view of a freshly created round. Never carries comparison values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundPublicView {
    pub id: RoundId,
    pub countdown_duration_ms: u64,
    pub candidates: Vec<CandidateView>,
}

impl From<&Round> for RoundPublicView {
    fn from(round: &Round) -> Self {
        let countdown_duration_ms = (round.expires_at - round.created_at)
            .num_milliseconds()
            .max(0) as u64;
        Self {
            id: round.id.clone(),
            countdown_duration_ms,
            candidates: round.candidates.clone(),
        }
    }
}

/// Body of `POST /api/answer`.
///
/// Missing `id`/`answer` deserialize to empty strings so they are judged as a
/// loss instead of being rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    #[serde(default)]
    pub id: RoundId,
    #[serde(default)]
    pub answer: CandidateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Error body for retryable server failures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub retryable: bool,
}
