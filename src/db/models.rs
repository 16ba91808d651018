//! Database models and conversions to leaderboard types.

use std::str::FromStr;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::games::factor::GameMode;
use crate::leaderboard::{ScoreRecord, ScoreSubmission};

/// Stored personal-best row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::scores)]
pub struct ScoreRow {
    id: i32,
    user_id: String,
    display_name: String,
    photo_url: Option<String>,
    mode: String,
    numbers_factored: i32,
    undos: i32,
    recorded_at: NaiveDateTime,
}

impl ScoreRow {
    /// Converts the row into a leaderboard record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the stored mode is unknown or a counter is negative.
    #[instrument(skip(self), fields(id = self.id))]
    pub fn into_record(self) -> Result<ScoreRecord, DbError> {
        let mode = GameMode::from_str(&self.mode)
            .map_err(|_| DbError::data(format!("Invalid mode: '{}'", self.mode)))?;
        let numbers_factored = u32::try_from(self.numbers_factored).map_err(|_| {
            DbError::data(format!("Negative numbers_factored: {}", self.numbers_factored))
        })?;
        let undos = u32::try_from(self.undos)
            .map_err(|_| DbError::data(format!("Negative undos: {}", self.undos)))?;
        Ok(ScoreRecord::new(
            i64::from(self.id),
            self.user_id,
            self.display_name,
            self.photo_url,
            mode,
            numbers_factored,
            undos,
            self.recorded_at,
        ))
    }
}

/// Insertable personal-best row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::scores)]
pub struct NewScoreRow {
    user_id: String,
    display_name: String,
    photo_url: Option<String>,
    mode: String,
    numbers_factored: i32,
    undos: i32,
    recorded_at: NaiveDateTime,
}

impl NewScoreRow {
    /// Builds a row from a submission, stamped with `recorded_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a counter does not fit the column type.
    #[instrument(skip(submission), fields(user_id = %submission.user_id()))]
    pub fn from_submission(
        submission: &ScoreSubmission,
        recorded_at: NaiveDateTime,
    ) -> Result<Self, DbError> {
        let numbers_factored = i32::try_from(*submission.numbers_factored())
            .map_err(|_| DbError::data("numbers_factored out of range"))?;
        let undos =
            i32::try_from(*submission.undos()).map_err(|_| DbError::data("undos out of range"))?;
        Ok(Self::new(
            submission.user_id().clone(),
            submission.display_name().clone(),
            submission.photo_url().clone(),
            submission.mode().to_string(),
            numbers_factored,
            undos,
            recorded_at,
        ))
    }
}
