//! SQLite persistence for personal-best scores.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::{DbError, DbErrorKind};
pub use models::{NewScoreRow, ScoreRow};
pub use repository::ScoreRepository;
