//! Database repository for personal-best scores.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{DbError, DbErrorKind, NewScoreRow, ScoreRow, schema};
use crate::games::factor::GameMode;
use crate::leaderboard::RankKey;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for score operations.
///
/// Opens a fresh connection per call; SQLite handles the file locking.
#[derive(Debug, Clone)]
pub struct ScoreRepository {
    db_path: String,
}

impl ScoreRepository {
    /// Opens the database at the given path and applies pending migrations.
    ///
    /// Use `":memory:"` only for throwaway checks: every call opens a new
    /// connection, so an in-memory database does not persist between calls.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, DbError> {
        info!(path = %db_path, "Opening ScoreRepository");
        let repo = Self { db_path };
        let mut conn = repo.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migration, e.to_string()))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(repo)
    }

    /// Returns the database path.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(DbErrorKind::Connection, format!("{}: {}", self.db_path, e)))
    }

    /// Gets the user's stored score for a mode. Returns `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn personal_best(&self, user_id: &str, mode: GameMode) -> Result<Option<ScoreRow>, DbError> {
        debug!("Loading personal best");
        let mut conn = self.connection()?;

        let row = schema::scores::table
            .filter(schema::scores::user_id.eq(user_id))
            .filter(schema::scores::mode.eq(mode.to_string()))
            .order((
                schema::scores::numbers_factored.desc(),
                schema::scores::undos.asc(),
            ))
            .select(ScoreRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row)
    }

    /// Replaces the user's stored score for the row's mode.
    ///
    /// Delete and insert run in one transaction, so readers never see
    /// zero or two records for the user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs; nothing is changed then.
    #[instrument(skip(self, row), fields(user_id = %row.user_id(), mode = %row.mode()))]
    pub fn replace_personal_best(&self, row: NewScoreRow) -> Result<ScoreRow, DbError> {
        debug!("Replacing personal best");
        let mut conn = self.connection()?;

        let stored = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let removed = diesel::delete(
                schema::scores::table
                    .filter(schema::scores::user_id.eq(row.user_id()))
                    .filter(schema::scores::mode.eq(row.mode())),
            )
            .execute(conn)?;
            debug!(removed, "Previous personal best removed");

            diesel::insert_into(schema::scores::table)
                .values(&row)
                .returning(ScoreRow::as_returning())
                .get_result(conn)
        })?;

        info!(
            score_id = stored.id(),
            numbers_factored = stored.numbers_factored(),
            undos = stored.undos(),
            "Personal best stored"
        );
        Ok(stored)
    }

    /// Gets up to `limit` scores for a mode, best first, ties by insertion.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn top_scores(&self, mode: GameMode, limit: i64) -> Result<Vec<ScoreRow>, DbError> {
        debug!("Loading top scores");
        let mut conn = self.connection()?;

        let rows = schema::scores::table
            .filter(schema::scores::mode.eq(mode.to_string()))
            .order((
                schema::scores::numbers_factored.desc(),
                schema::scores::undos.asc(),
                schema::scores::recorded_at.asc(),
                schema::scores::id.asc(),
            ))
            .limit(limit)
            .select(ScoreRow::as_select())
            .load(&mut conn)?;

        info!(count = rows.len(), "Top scores loaded");
        Ok(rows)
    }

    /// Counts scores for a mode that strictly outrank `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn count_outranking(&self, mode: GameMode, key: RankKey) -> Result<i64, DbError> {
        let mut conn = self.connection()?;
        let factored = i32::try_from(key.numbers_factored)
            .map_err(|_| DbError::data("numbers_factored out of range"))?;
        let undos = i32::try_from(key.undos).map_err(|_| DbError::data("undos out of range"))?;

        let count = schema::scores::table
            .filter(schema::scores::mode.eq(mode.to_string()))
            .filter(
                schema::scores::numbers_factored.gt(factored).or(schema::scores::numbers_factored
                    .eq(factored)
                    .and(schema::scores::undos.lt(undos))),
            )
            .count()
            .get_result::<i64>(&mut conn)?;

        debug!(count, "Outranking scores counted");
        Ok(count)
    }

    /// Counts all stored scores for a mode.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn count_for_mode(&self, mode: GameMode) -> Result<i64, DbError> {
        let mut conn = self.connection()?;
        let count = schema::scores::table
            .filter(schema::scores::mode.eq(mode.to_string()))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(count)
    }
}
