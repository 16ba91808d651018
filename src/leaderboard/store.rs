//! Score storage seam and its in-memory implementation.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::error::LeaderboardError;
use super::record::{RankKey, ScoreRecord, ScoreSubmission, leaderboard_order};
use crate::games::factor::GameMode;

/// Persistence contract consumed by [`Leaderboard`](super::Leaderboard).
///
/// Implementations hold at most one record per (user, mode).
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Returns the user's stored record for `mode`, if any.
    async fn personal_best(
        &self,
        user_id: &str,
        mode: GameMode,
    ) -> Result<Option<ScoreRecord>, LeaderboardError>;

    /// Replaces the user's record for the submission's mode, atomically.
    async fn replace_personal_best(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<ScoreRecord, LeaderboardError>;

    /// Returns up to `n` records for `mode`, best first.
    async fn top_n(&self, mode: GameMode, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError>;

    /// Counts records for `mode` that strictly outrank `key`.
    async fn count_outranking(&self, mode: GameMode, key: RankKey)
    -> Result<u64, LeaderboardError>;
}

/// Process-local store, used by tests and by players without a database.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    records: Vec<ScoreRecord>,
}

impl MemoryScoreStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating MemoryScoreStore");
        Self::default()
    }

    /// Returns the number of stored records across all modes.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    #[instrument(skip(self))]
    async fn personal_best(
        &self,
        user_id: &str,
        mode: GameMode,
    ) -> Result<Option<ScoreRecord>, LeaderboardError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.user_id() == user_id && *r.mode() == mode)
            .min_by(|a, b| leaderboard_order(a, b))
            .cloned())
    }

    #[instrument(skip(self, submission), fields(user_id = %submission.user_id(), mode = %submission.mode()))]
    async fn replace_personal_best(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<ScoreRecord, LeaderboardError> {
        let mut inner = self.inner.lock().await;
        inner
            .records
            .retain(|r| !(r.user_id() == submission.user_id() && r.mode() == submission.mode()));

        inner.next_id += 1;
        let record = ScoreRecord::new(
            inner.next_id,
            submission.user_id().clone(),
            submission.display_name().clone(),
            submission.photo_url().clone(),
            *submission.mode(),
            *submission.numbers_factored(),
            *submission.undos(),
            Utc::now().naive_utc(),
        );
        inner.records.push(record.clone());
        debug!(record_id = record.id(), "Personal best stored");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn top_n(&self, mode: GameMode, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        let inner = self.inner.lock().await;
        let mut records: Vec<ScoreRecord> = inner
            .records
            .iter()
            .filter(|r| *r.mode() == mode)
            .cloned()
            .collect();
        records.sort_by(leaderboard_order);
        records.truncate(n);
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn count_outranking(
        &self,
        mode: GameMode,
        key: RankKey,
    ) -> Result<u64, LeaderboardError> {
        let inner = self.inner.lock().await;
        let count = inner
            .records
            .iter()
            .filter(|r| *r.mode() == mode && r.key().outranks(&key))
            .count();
        Ok(count as u64)
    }
}
