//! Factor Rush - a timed prime-factorization game
//!
//! The player rebuilds a target number from a fixed palette of primes before
//! the clock runs out, and competes for a place on a per-mode leaderboard.
//!
//! # Architecture
//!
//! - **Games**: number theory, target generation and per-round bookkeeping
//! - **Session**: the screen state machine, driven by intents and a clock
//! - **Leaderboard**: personal-best ranking over an async score store
//! - **Db**: SQLite persistence with embedded migrations
//!
//! # Example
//!
//! ```
//! use factor_rush::{GameConfig, Intent, ManualClock, Screen, Session};
//!
//! let clock = ManualClock::new();
//! let mut session = Session::from_config(&GameConfig::default());
//! session.dispatch(Intent::StartCountdown);
//! assert_eq!(session.screen(), Screen::Countdown);
//!
//! clock.advance_millis(3_500);
//! session.advance(&clock);
//! assert_eq!(session.screen(), Screen::Playing);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod clock;
mod config;
mod db;
mod feedback;
mod games;
mod identity;
mod leaderboard;
mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, DB_PATH_ENV, GameConfig};

// Crate-level exports - Persistence
pub use db::{DbError, DbErrorKind, NewScoreRow, ScoreRepository, ScoreRow};

// Crate-level exports - Timers and feedback hooks
pub use clock::{Clock, ManualClock, MonotonicClock, Scheduler, TimerEvent, TimerId};
pub use feedback::{BellFeedback, Feedback, SilentFeedback, TracingFeedback};

// Crate-level exports - Player identity
pub use identity::PlayerIdentity;

// Crate-level exports - Session state machine
pub use session::{Intent, Session};

// Crate-level exports - Game types
pub use games::factor::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PALETTE, DEFAULT_PRIME_PROBABILITY, FALLBACK_COMPOSITE,
    GameMode, GameSnapshot, LARGE_PRIMES, MoveOutcome, Palette, ProductConsistent,
    QuotientConsistent, Round, Scores, Screen, ScriptedTargets, Target, TargetGenerator,
    TargetSource, generate_composite, generate_large_prime, generate_target,
    is_factorizable_over, is_prime, product,
};

// Crate-level exports - Leaderboard
pub use leaderboard::{
    Leaderboard, LeaderboardError, MemoryScoreStore, Rank, RankKey, ScoreRecord, ScoreStore,
    ScoreSubmission, SqliteScoreStore, SubmitOutcome, TopNSubscription, is_personal_best,
    leaderboard_order,
};
