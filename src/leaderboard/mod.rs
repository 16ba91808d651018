//! Personal-best leaderboard.
//!
//! Ranking is lexicographic: more numbers factored first, fewer undos as
//! tiebreak. Each player holds one record per [`GameMode`](crate::GameMode).

mod error;
mod record;
mod service;
mod sqlite;
mod store;

pub use error::LeaderboardError;
pub use record::{Rank, RankKey, ScoreRecord, ScoreSubmission, is_personal_best, leaderboard_order};
pub use service::{Leaderboard, SubmitOutcome, TopNSubscription};
pub use sqlite::SqliteScoreStore;
pub use store::{MemoryScoreStore, ScoreStore};
