//! Player session as a pure state machine.
//!
//! `transition` maps (state, event) to the next state plus at most one side
//! effect for the controller to perform. Nothing here touches the network.

use crate::protocol::{RoundPublicView, SubmitAnswerRequest};
use crate::types::{IdempotencyKey, ScoreVerdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Waiting for a new round
    Loading,
    /// Round on screen, waiting for the player
    Ready,
    /// Answer in flight
    Submitting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub cumulative_score: u64,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub current_round: Option<RoundPublicView>,
    pub last_message: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            cumulative_score: 0,
            correct_count: 0,
            incorrect_count: 0,
            current_round: None,
            last_message: String::new(),
        }
    }
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Ready
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Start,
    RoundLoaded(RoundPublicView),
    /// Create gave up after its retry budget
    RoundFailed,
    /// Player picked a candidate; the key is reused for every delivery attempt
    Choose {
        index: usize,
        idempotency_key: IdempotencyKey,
    },
    VerdictReceived(ScoreVerdict),
    /// Submit gave up after its retry budget
    SubmitFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CreateRound,
    SubmitAnswer(SubmitAnswerRequest),
}

pub fn transition(state: &SessionState, event: SessionEvent) -> (SessionState, Option<Effect>) {
    use SessionEvent::*;

    match (state.phase, event) {
        (Phase::Idle, Start) => (
            SessionState {
                phase: Phase::Loading,
                ..state.clone()
            },
            Some(Effect::CreateRound),
        ),

        (Phase::Loading, RoundLoaded(round)) => (
            SessionState {
                phase: Phase::Ready,
                current_round: Some(round),
                ..state.clone()
            },
            None,
        ),

        // Keep the spinner up and ask again
        (Phase::Loading, RoundFailed) => (state.clone(), Some(Effect::CreateRound)),

        (
            Phase::Ready,
            Choose {
                index,
                idempotency_key,
            },
        ) => {
            let request = state.current_round.as_ref().and_then(|round| {
                round.candidates.get(index).map(|candidate| SubmitAnswerRequest {
                    id: round.id.clone(),
                    answer: candidate.name.clone(),
                    idempotency_key: Some(idempotency_key),
                })
            });
            let Some(request) = request else {
                return (state.clone(), None);
            };

            (
                SessionState {
                    phase: Phase::Submitting,
                    last_message: String::new(),
                    ..state.clone()
                },
                Some(Effect::SubmitAnswer(request)),
            )
        }

        (Phase::Submitting, VerdictReceived(verdict)) => (
            SessionState {
                phase: Phase::Loading,
                cumulative_score: state.cumulative_score + u64::from(verdict.points),
                correct_count: state.correct_count + u32::from(verdict.correct),
                incorrect_count: state.incorrect_count + u32::from(!verdict.correct),
                current_round: None,
                last_message: verdict.message,
            },
            Some(Effect::CreateRound),
        ),

        // Nothing to show; move on to the next round
        (Phase::Submitting, SubmitFailed) => (
            SessionState {
                phase: Phase::Loading,
                current_round: None,
                ..state.clone()
            },
            Some(Effect::CreateRound),
        ),

        (phase, event) => {
            tracing::debug!(?phase, ?event, "Ignoring event");
            (state.clone(), None)
        }
    }
}
