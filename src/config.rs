//! Game configuration loaded from TOML.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::games::factor::{DEFAULT_PRIME_PROBABILITY, Palette};

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "FACTOR_RUSH_DB";

/// Tunable game parameters.
///
/// Every field has a default, so an empty file is a valid configuration.
/// Changing these alters difficulty, not game rules.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    /// Selectable primes, strictly ascending.
    #[serde(default)]
    palette: Palette,

    /// Smallest composite target.
    #[serde(default = "default_target_min")]
    target_min: u32,

    /// Largest composite target.
    #[serde(default = "default_target_max")]
    target_max: u32,

    /// Probability that a round's target is a prime to recognize.
    #[serde(default = "default_prime_probability")]
    prime_probability: f64,

    /// Length of a game in seconds.
    #[serde(default = "default_round_seconds")]
    round_seconds: u32,

    /// First value of the pre-game countdown.
    #[serde(default = "default_countdown_from")]
    countdown_from: u32,

    /// Pause between the countdown reaching zero and play starting.
    #[serde(default = "default_go_delay_ms")]
    go_delay_ms: u64,

    /// Pause between solving a target and the next one appearing.
    #[serde(default = "default_match_delay_ms")]
    match_delay_ms: u64,

    /// Number of entries shown on the leaderboard.
    #[serde(default = "default_leaderboard_size")]
    leaderboard_size: usize,

    /// SQLite database file for scores.
    #[serde(default = "default_db_path")]
    db_path: String,
}

fn default_target_min() -> u32 {
    5
}

fn default_target_max() -> u32 {
    100
}

fn default_prime_probability() -> f64 {
    DEFAULT_PRIME_PROBABILITY
}

fn default_round_seconds() -> u32 {
    60
}

fn default_countdown_from() -> u32 {
    3
}

fn default_go_delay_ms() -> u64 {
    500
}

fn default_match_delay_ms() -> u64 {
    600
}

fn default_leaderboard_size() -> usize {
    10
}

fn default_db_path() -> String {
    "factor_rush.db".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            target_min: default_target_min(),
            target_max: default_target_max(),
            prime_probability: default_prime_probability(),
            round_seconds: default_round_seconds(),
            countdown_from: default_countdown_from(),
            go_delay_ms: default_go_delay_ms(),
            match_delay_ms: default_match_delay_ms(),
            leaderboard_size: default_leaderboard_size(),
            db_path: default_db_path(),
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or fails validation.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the string is malformed or fails validation.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(
            palette = ?config.palette.primes(),
            round_seconds = config.round_seconds,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Serializes the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization fails.
    #[instrument(skip(self))]
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to serialize config: {}", e)))
    }

    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first violated constraint.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_min < 2 {
            return Err(ConfigError::new(format!(
                "target_min must be at least 2, got {}",
                self.target_min
            )));
        }
        if self.target_min > self.target_max {
            return Err(ConfigError::new(format!(
                "target_min ({}) exceeds target_max ({})",
                self.target_min, self.target_max
            )));
        }
        if !(0.0..=1.0).contains(&self.prime_probability) {
            return Err(ConfigError::new(format!(
                "prime_probability must be within [0, 1], got {}",
                self.prime_probability
            )));
        }
        if self.round_seconds == 0 {
            return Err(ConfigError::new("round_seconds must be positive".to_string()));
        }
        if self.countdown_from == 0 {
            return Err(ConfigError::new("countdown_from must be positive".to_string()));
        }
        if self.leaderboard_size == 0 {
            return Err(ConfigError::new(
                "leaderboard_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies the `FACTOR_RUSH_DB` environment override, if set.
    #[instrument(skip(self))]
    pub fn apply_env(mut self) -> Self {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            debug!(db_path = %path, "Database path overridden from environment");
            self.db_path = path;
        }
        self
    }

    /// Delay between the countdown reaching zero and play starting.
    pub fn go_delay(&self) -> Duration {
        Duration::from_millis(self.go_delay_ms)
    }

    /// Delay between solving a target and the next one appearing.
    pub fn match_delay(&self) -> Duration {
        Duration::from_millis(self.match_delay_ms)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
