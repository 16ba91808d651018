//! Command-line interface for factor_rush.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use factor_rush::GameMode;

/// Factor Rush - race the clock to rebuild numbers from primes
#[derive(Parser, Debug)]
#[command(name = "factor_rush")]
#[command(about = "Timed prime-factorization game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play in the terminal
    Play {
        /// Path to a TOML game config (defaults apply if missing)
        #[arg(short, long, default_value = "factor_rush.toml")]
        config: PathBuf,

        /// Database file for the leaderboard (overrides config and FACTOR_RUSH_DB)
        #[arg(long)]
        db_path: Option<String>,

        /// Display name; scores are only saved when a player is given
        #[arg(short, long)]
        player: Option<String>,

        /// Stable player id (derived from the name if omitted)
        #[arg(long)]
        player_id: Option<String>,

        /// Starting mode
        #[arg(short, long, default_value_t = GameMode::Normal)]
        mode: GameMode,

        /// Seed for the target generator (reproducible games)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print a leaderboard
    Leaderboard {
        /// Mode to rank
        #[arg(short, long, default_value_t = GameMode::Normal)]
        mode: GameMode,

        /// Number of entries
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Database file (overrides FACTOR_RUSH_DB)
        #[arg(long)]
        db_path: Option<String>,

        /// Also print this player's rank
        #[arg(long)]
        player_id: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate a config file and print the effective settings
    CheckConfig {
        /// Path to the TOML game config
        #[arg(short, long, default_value = "factor_rush.toml")]
        config: PathBuf,
    },
}
