//! Score records and the ranking rule.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::PlayerIdentity;
use crate::games::factor::{GameMode, Scores};

/// Ranking key: more factorizations first, then fewer undos.
///
/// `a > b` means `a` strictly outranks `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct RankKey {
    /// Targets solved.
    pub numbers_factored: u32,
    /// Undos used.
    pub undos: u32,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers_factored
            .cmp(&other.numbers_factored)
            .then_with(|| other.undos.cmp(&self.undos))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl RankKey {
    /// Returns true if `self` is strictly better than `other`.
    pub fn outranks(&self, other: &RankKey) -> bool {
        self > other
    }
}

/// Returns true if `candidate` should replace `stored` as a personal best.
///
/// Any score beats no score; otherwise the candidate must strictly outrank.
pub fn is_personal_best(candidate: RankKey, stored: Option<RankKey>) -> bool {
    stored.is_none_or(|best| candidate.outranks(&best))
}

/// A finished game ready for the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct ScoreSubmission {
    user_id: String,
    display_name: String,
    photo_url: Option<String>,
    mode: GameMode,
    numbers_factored: u32,
    undos: u32,
}

impl ScoreSubmission {
    /// Builds a submission from a player's final counters.
    pub fn from_game(player: &PlayerIdentity, mode: GameMode, scores: Scores) -> Self {
        Self {
            user_id: player.id().clone(),
            display_name: player.display_name().clone(),
            photo_url: player.photo_url().clone(),
            mode,
            numbers_factored: *scores.correct_factors(),
            undos: *scores.undo_count(),
        }
    }

    /// Returns the ranking key.
    pub fn key(&self) -> RankKey {
        RankKey::new(self.numbers_factored, self.undos)
    }
}

/// A stored personal best. At most one exists per (user, mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct ScoreRecord {
    id: i64,
    user_id: String,
    display_name: String,
    photo_url: Option<String>,
    mode: GameMode,
    numbers_factored: u32,
    undos: u32,
    recorded_at: NaiveDateTime,
}

impl ScoreRecord {
    /// Returns the ranking key.
    pub fn key(&self) -> RankKey {
        RankKey::new(self.numbers_factored, self.undos)
    }
}

/// Orders records best first; ties keep insertion order.
pub fn leaderboard_order(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.key()
        .cmp(&a.key())
        .then_with(|| a.recorded_at.cmp(&b.recorded_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// A player's position on a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    /// 1-based position.
    Ranked(u64),
    /// The player has no stored score for the mode.
    Unranked,
}

impl Rank {
    /// Returns the position, if ranked.
    pub fn position(self) -> Option<u64> {
        match self {
            Self::Ranked(n) => Some(n),
            Self::Unranked => None,
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Ranked(n) => write!(f, "#{}", n),
            Rank::Unranked => write!(f, "unranked"),
        }
    }
}
