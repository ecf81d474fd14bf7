//! Round store persisted as a JSON snapshot on disk.
//!
//! Every mutation is applied to a staged copy, written out (temp file +
//! rename), and only then made visible. A failed write leaves both memory
//! and disk as they were, so a restart picks up exactly the rounds that were
//! acknowledged to clients.

use super::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Schema version for snapshot compatibility
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    /// Snapshot timestamp (ISO8601)
    pub written_at: String,
    pub rounds: HashMap<RoundId, Round>,
}

impl StoreSnapshot {
    fn new(rounds: HashMap<RoundId, Round>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            written_at: Utc::now().to_rfc3339(),
            rounds,
        }
    }

    fn validate(&self) -> StoreResult<()> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(StoreError::Corrupt(format!(
                "snapshot schema version {} is newer than supported version {}",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }
        for (key, round) in &self.rounds {
            if *key != round.id {
                return Err(StoreError::Corrupt(format!(
                    "round stored under '{}' claims id '{}'",
                    key, round.id
                )));
            }
        }
        Ok(())
    }
}

pub struct FileStore {
    inner: MemoryStore,
    path: PathBuf,
    /// Serializes mutate-then-write so snapshots land in mutation order
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the snapshot at `path`, starting empty if it does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let rounds = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?;
                snapshot.validate()?;
                tracing::info!(
                    path = %path.display(),
                    rounds = snapshot.rounds.len(),
                    "Loaded round snapshot"
                );
                snapshot.rounds
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No round snapshot yet, starting empty");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: MemoryStore::from_rounds(rounds),
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current rounds for a mutation to work on
    async fn stage(&self) -> MemoryStore {
        MemoryStore::from_rounds(self.inner.snapshot().await)
    }

    /// Write `staged` to disk, then publish it in memory
    async fn commit(&self, staged: MemoryStore) -> StoreResult<()> {
        let rounds = staged.snapshot().await;
        self.write_snapshot(&rounds).await?;
        self.inner.replace(rounds).await;
        Ok(())
    }

    async fn write_snapshot(&self, rounds: &HashMap<RoundId, Round>) -> StoreResult<()> {
        let snapshot = StoreSnapshot::new(rounds.clone());
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RoundStore for FileStore {
    async fn insert(&self, round: Round) -> StoreResult<RoundId> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage().await;
        let id = staged.insert(round).await?;
        self.commit(staged).await?;
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Round>> {
        self.inner.find_by_id(id).await
    }

    async fn consume(&self, id: &str, answer: AnswerRecord) -> StoreResult<ConsumeOutcome> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage().await;
        let outcome = staged.consume(id, answer).await?;
        if outcome == ConsumeOutcome::Consumed {
            self.commit(staged).await?;
        }
        Ok(outcome)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let _guard = self.write_lock.lock().await;
        let staged = self.stage().await;
        let purged = staged.purge_expired(cutoff).await?;
        if purged > 0 {
            self.commit(staged).await?;
        }
        Ok(purged)
    }

    async fn len(&self) -> StoreResult<usize> {
        self.inner.len().await
    }
}
