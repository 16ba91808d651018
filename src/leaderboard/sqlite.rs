//! [`ScoreStore`] backed by the SQLite repository.

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use super::error::LeaderboardError;
use super::record::{RankKey, ScoreRecord, ScoreSubmission};
use super::store::ScoreStore;
use crate::db::{NewScoreRow, ScoreRepository};
use crate::games::factor::GameMode;

/// Runs blocking diesel calls on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteScoreStore {
    repository: ScoreRepository,
}

impl SqliteScoreStore {
    /// Wraps an opened repository.
    pub fn new(repository: ScoreRepository) -> Self {
        Self { repository }
    }

    /// Opens (and migrates) the database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardError`] if the database cannot be opened.
    #[instrument]
    pub fn open(db_path: &str) -> Result<Self, LeaderboardError> {
        Ok(Self::new(ScoreRepository::open(db_path.to_string())?))
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &ScoreRepository {
        &self.repository
    }
}

#[async_trait]
impl ScoreStore for SqliteScoreStore {
    #[instrument(skip(self))]
    async fn personal_best(
        &self,
        user_id: &str,
        mode: GameMode,
    ) -> Result<Option<ScoreRecord>, LeaderboardError> {
        let repository = self.repository.clone();
        let user_id = user_id.to_string();
        let row =
            tokio::task::spawn_blocking(move || repository.personal_best(&user_id, mode)).await??;
        Ok(row.map(|r| r.into_record()).transpose()?)
    }

    #[instrument(skip(self, submission), fields(user_id = %submission.user_id()))]
    async fn replace_personal_best(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<ScoreRecord, LeaderboardError> {
        let repository = self.repository.clone();
        let row = NewScoreRow::from_submission(submission, Utc::now().naive_utc())?;
        let stored =
            tokio::task::spawn_blocking(move || repository.replace_personal_best(row)).await??;
        Ok(stored.into_record()?)
    }

    #[instrument(skip(self))]
    async fn top_n(&self, mode: GameMode, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        let repository = self.repository.clone();
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        let rows = tokio::task::spawn_blocking(move || repository.top_scores(mode, limit)).await??;
        rows.into_iter()
            .map(|r| r.into_record().map_err(LeaderboardError::from))
            .collect()
    }

    #[instrument(skip(self))]
    async fn count_outranking(
        &self,
        mode: GameMode,
        key: RankKey,
    ) -> Result<u64, LeaderboardError> {
        let repository = self.repository.clone();
        let count =
            tokio::task::spawn_blocking(move || repository.count_outranking(mode, key)).await??;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
