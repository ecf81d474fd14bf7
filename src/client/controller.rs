use super::*;
use async_trait::async_trait;

/// Presentation side of a session: shows state, collects choices
#[async_trait]
pub trait Frontend: Send {
    /// Called after every state change
    fn render(&mut self, state: &SessionState);

    /// Index of the chosen candidate, or `None` to end the session
    async fn choose(&mut self, round: &RoundPublicView) -> Option<usize>;
}

/// Runs the session state machine, performing its effects over a transport
pub struct SessionController<T, F> {
    transport: T,
    frontend: F,
    state: SessionState,
    /// Pause before asking for a new round after create gave up
    reload_pause: Duration,
}

impl<T: GameTransport, F: Frontend> SessionController<T, F> {
    pub fn new(transport: T, frontend: F) -> Self {
        Self {
            transport,
            frontend,
            state: SessionState::default(),
            reload_pause: Duration::from_secs(1),
        }
    }

    pub fn with_reload_pause(mut self, pause: Duration) -> Self {
        self.reload_pause = pause;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn apply(&mut self, event: SessionEvent) -> Option<Effect> {
        let (next, effect) = transition(&self.state, event);
        self.state = next;
        self.frontend.render(&self.state);
        effect
    }

    /// Play until the frontend stops choosing; returns the final state
    pub async fn run(mut self) -> SessionState {
        let mut effect = self.apply(SessionEvent::Start);

        loop {
            let event = match effect.take() {
                Some(Effect::CreateRound) => match self.transport.create_round().await {
                    Ok(round) => SessionEvent::RoundLoaded(round),
                    Err(e) => {
                        tracing::warn!("Could not load a round: {}", e);
                        tokio::time::sleep(self.reload_pause).await;
                        SessionEvent::RoundFailed
                    }
                },
                Some(Effect::SubmitAnswer(request)) => {
                    match self.transport.submit_answer(&request).await {
                        Ok(verdict) => SessionEvent::VerdictReceived(verdict),
                        Err(e) => {
                            tracing::warn!(round_id = %request.id, "Answer was not delivered: {}", e);
                            SessionEvent::SubmitFailed
                        }
                    }
                }
                None => {
                    let Some(round) = self.state.current_round.clone() else {
                        break;
                    };
                    match self.frontend.choose(&round).await {
                        Some(index) => SessionEvent::Choose {
                            index,
                            idempotency_key: ulid::Ulid::new().to_string(),
                        },
                        None => break,
                    }
                }
            };

            effect = self.apply(event);
        }

        self.state
    }
}
