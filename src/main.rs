//! Factor Rush - Unified CLI
//!
//! Play in the terminal, inspect leaderboards, and check configuration.

#![warn(missing_docs)]

mod cli;
mod tui;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use factor_rush::{
    BellFeedback, GameConfig, GameMode, Intent, Leaderboard, PlayerIdentity, SqliteScoreStore,
    Session, TargetGenerator, TargetSource,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            db_path,
            player,
            player_id,
            mode,
            seed,
        } => run_play(&config, db_path, player, player_id, mode, seed).await,
        Command::Leaderboard {
            mode,
            limit,
            db_path,
            player_id,
            json,
        } => run_leaderboard(mode, limit, db_path, player_id, json).await,
        Command::CheckConfig { config } => run_check_config(&config),
    }
}

/// Run the game in the terminal
#[instrument(skip_all, fields(config_path = %config_path.display()))]
async fn run_play(
    config_path: &Path,
    db_path: Option<String>,
    player: Option<String>,
    player_id: Option<String>,
    mode: GameMode,
    seed: Option<u64>,
) -> Result<()> {
    initialize_file_tracing()?;

    let mut config = load_config(config_path)?;
    if let Some(path) = db_path {
        config = config.with_db_path(path);
    }

    let targets: Box<dyn TargetSource> = match seed {
        Some(seed) => {
            info!(seed, "Using seeded target generator");
            Box::new(TargetGenerator::seeded(&config, seed))
        }
        None => Box::new(TargetGenerator::from_config(&config)),
    };
    let mut session = Session::new(&config, targets, Box::new(BellFeedback));
    session.dispatch(Intent::SetMode(mode));

    let identity = current_user(player, player_id);

    // Without a database the game is still playable; scores just aren't saved.
    let leaderboard = match SqliteScoreStore::open(config.db_path()) {
        Ok(store) => Some(Leaderboard::new(store)),
        Err(e) => {
            warn!(error = %e, "Leaderboard unavailable, continuing without it");
            None
        }
    };

    let app = tui::App::new(session, identity, leaderboard, *config.leaderboard_size());
    tui::run_tui(app).await
}

/// Print a leaderboard to stdout
#[instrument]
async fn run_leaderboard(
    mode: GameMode,
    limit: usize,
    db_path: Option<String>,
    player_id: Option<String>,
    json: bool,
) -> Result<()> {
    initialize_stderr_tracing();

    let db_path = db_path.unwrap_or_else(|| GameConfig::default().apply_env().db_path().clone());
    let store = SqliteScoreStore::open(&db_path)
        .with_context(|| format!("opening leaderboard database '{}'", db_path))?;
    let leaderboard = Leaderboard::new(store);

    let entries = leaderboard.top_n(mode, limit).await?;
    let rank = match &player_id {
        Some(id) => Some(leaderboard.rank_of(id, mode).await?),
        None => None,
    };

    if json {
        let body = serde_json::json!({
            "mode": mode,
            "entries": entries,
            "rank": rank,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Leaderboard - {} mode", mode.label());
    if entries.is_empty() {
        println!("  no scores yet");
    }
    for (i, record) in entries.iter().enumerate() {
        println!(
            "{:>3}. {:<24} {:>4} factored {:>4} undos",
            i + 1,
            record.display_name(),
            record.numbers_factored(),
            record.undos()
        );
    }
    if let (Some(id), Some(rank)) = (player_id, rank) {
        println!("{}: {}", id, rank);
    }
    Ok(())
}

/// Validate a config file and print the effective settings
#[instrument(skip_all, fields(config_path = %config_path.display()))]
fn run_check_config(config_path: &Path) -> Result<()> {
    initialize_stderr_tracing();

    let config = load_config(config_path)?;
    println!("# {} is valid", config_path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}

#[instrument(skip(config_path))]
fn load_config(config_path: &Path) -> Result<GameConfig> {
    let config = if config_path.exists() {
        GameConfig::from_file(config_path)?
    } else {
        info!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        GameConfig::default()
    };
    Ok(config.apply_env())
}

/// Builds the player identity from CLI flags. No name means a guest.
fn current_user(player: Option<String>, player_id: Option<String>) -> Option<PlayerIdentity> {
    let name = player?;
    let identity = match player_id {
        Some(id) => PlayerIdentity::new(id, name, None),
        None => PlayerIdentity::local(&name),
    };
    info!(user_id = %identity.id(), "Player identified");
    Some(identity)
}

/// Logs to a file so output doesn't corrupt the terminal UI.
fn initialize_file_tracing() -> Result<()> {
    let log_file = std::fs::File::create("factor_rush.log")?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,factor_rush=debug")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init(); // Don't panic if already initialized
    Ok(())
}

fn initialize_stderr_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
