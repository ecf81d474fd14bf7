mod answer;
mod round;
mod verdict;

use std::sync::Arc;

use crate::config::GameConfig;
use crate::source::{CandidateSource, SourceError};
use crate::store::{RoundStore, StoreError};

pub use round::pick_pair;
pub use verdict::{generic_loss, render_message};

/// Result type for round engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no candidates available: {0}")]
    CandidateUnavailable(#[from] SourceError),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

/// Creates rounds and judges answers.
///
/// Holds no per-request state; everything a round needs lives in the store,
/// so any instance sharing the store can serve either half of a round.
pub struct RoundEngine {
    source: Arc<dyn CandidateSource>,
    store: Arc<dyn RoundStore>,
    config: GameConfig,
}

impl RoundEngine {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        store: Arc<dyn RoundStore>,
        config: GameConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RoundStore> {
        &self.store
    }
}
