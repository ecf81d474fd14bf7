//! Game client: drives the play loop against the HTTP API.

mod controller;
mod http;
mod retry;
mod session;

use async_trait::async_trait;
use std::time::Duration;

use crate::protocol::{RoundPublicView, SubmitAnswerRequest};
use crate::types::ScoreVerdict;

pub use controller::{Frontend, SessionController};
pub use http::HttpTransport;
pub use retry::{Backoff, RetryPolicy, DEFAULT_RETRYABLE_STATUSES};
pub use session::{transition, Effect, Phase, SessionEvent, SessionState};

/// Result type for client transport operations
pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {message}")]
    Network { message: String, timeout: bool },

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<TransportError>,
    },
}

impl TransportError {
    /// Whether the last failure was the per-attempt timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Network { timeout, .. } => *timeout,
            Self::Exhausted { last, .. } => last.is_timeout(),
            Self::Status { .. } | Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network {
                timeout: err.is_timeout(),
                message: err.to_string(),
            }
        }
    }
}

/// How the session talks to the game API
#[async_trait]
pub trait GameTransport: Send + Sync {
    async fn create_round(&self) -> TransportResult<RoundPublicView>;

    async fn submit_answer(&self, request: &SubmitAnswerRequest) -> TransportResult<ScoreVerdict>;
}

/// Configuration for the game client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the game API
    pub base_url: String,
    pub retry: RetryPolicy,
    /// Per-attempt request timeout
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7827".to_string(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("STARDASH_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);

        let max_attempts = std::env::var("CLIENT_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(|n| n.max(1))
            .unwrap_or(defaults.retry.max_attempts);

        let delay = std::env::var("CLIENT_RETRY_DELAY_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(2000));

        let backoff = match std::env::var("CLIENT_BACKOFF").as_deref().map(str::trim) {
            Ok("exponential") => Backoff::Exponential {
                base: delay,
                max: Duration::from_secs(30),
            },
            Ok("fixed") | Err(_) => Backoff::Fixed(delay),
            Ok(other) => {
                tracing::warn!("Unknown CLIENT_BACKOFF '{}', using fixed delay", other);
                Backoff::Fixed(delay)
            }
        };

        Self {
            base_url,
            retry: RetryPolicy {
                max_attempts,
                backoff,
                retry_on: defaults.retry.retry_on,
            },
            request_timeout: defaults.request_timeout,
        }
    }
}
