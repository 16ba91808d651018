//! Terminal UI for Factor Rush

mod app;
mod input;
mod ui;

use std::io;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use factor_rush::{MonotonicClock, ScoreStore};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::time::{Duration, sleep};
use tracing::{debug, error, info, instrument};

pub use app::App;

/// Runs the game in the terminal until the user quits.
pub async fn run_tui<S: ScoreStore + 'static>(mut app: App<S>) -> Result<()> {
    info!("Starting Factor Rush TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "Game loop error");
    }
    res
}

/// Draw, poll input, advance timers.
#[instrument(skip_all)]
async fn run_loop<S: ScoreStore + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
) -> Result<()> {
    let clock = MonotonicClock::new();

    loop {
        app.tick(&clock).await;
        terminal.draw(|f| app.render(f))?;

        // Short poll keeps the countdown and game clock responsive.
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
        {
            // Skip key release events (crossterm fires both press and release).
            if key.kind == KeyEventKind::Release {
                continue;
            }
            debug!(code = ?key.code, view = ?app.view(), "Key pressed");
            if !app.handle_key(key.code).await {
                info!(status = app.status(), "User quit");
                return Ok(());
            }
        }

        sleep(Duration::from_millis(10)).await;
    }
}
