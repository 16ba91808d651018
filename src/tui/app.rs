//! Application state and logic.

use crossterm::event::KeyCode;
use factor_rush::{
    Clock, GameMode, GameSnapshot, Intent, Leaderboard, PlayerIdentity, Rank, ScoreRecord,
    ScoreStore, Screen, Session, SubmitOutcome, TopNSubscription,
};
use ratatui::Frame;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use super::input::{BoardAction, GameAction, board_action, game_action};
use super::ui;

/// Which view fills the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The session's current screen.
    Game,
    /// A mode's top-N table.
    Leaderboard,
}

/// Load state of the leaderboard table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardState {
    /// Waiting for the first update.
    Loading,
    /// Entries are current.
    Ready,
    /// The table could not be fetched; the game keeps working.
    Unavailable(String),
}

/// What the leaderboard view shows.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub mode: GameMode,
    pub entries: Vec<ScoreRecord>,
    pub rank: Option<Rank>,
    pub state: BoardState,
}

impl BoardView {
    fn loading(mode: GameMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
            rank: None,
            state: BoardState::Loading,
        }
    }
}

/// Main application state.
#[derive(Debug)]
pub struct App<S: ScoreStore + 'static> {
    session: Session,
    snapshots: watch::Receiver<GameSnapshot>,
    player: Option<PlayerIdentity>,
    leaderboard: Option<Leaderboard<S>>,
    board_size: usize,
    view: View,
    board: BoardView,
    subscription: Option<TopNSubscription>,
    notices_tx: mpsc::UnboundedSender<String>,
    notices_rx: mpsc::UnboundedReceiver<String>,
    status: String,
    last_screen: Screen,
}

impl<S: ScoreStore + 'static> App<S> {
    /// Creates the application around a session.
    #[instrument(skip_all)]
    pub fn new(
        session: Session,
        player: Option<PlayerIdentity>,
        leaderboard: Option<Leaderboard<S>>,
        board_size: usize,
    ) -> Self {
        let snapshots = session.subscribe();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let status = match (&player, &leaderboard) {
            (None, _) => "Playing as guest: scores are not saved".to_string(),
            (Some(_), None) => "Leaderboard unavailable: scores are not saved".to_string(),
            (Some(p), Some(_)) => format!("Signed in as {}", p.display_name()),
        };
        let last_screen = session.screen();
        let mode = session.game_mode();
        info!(guest = player.is_none(), "Creating App");
        Self {
            session,
            snapshots,
            player,
            leaderboard,
            board_size,
            view: View::Game,
            board: BoardView::loading(mode),
            subscription: None,
            notices_tx,
            notices_rx,
            status,
            last_screen,
        }
    }

    /// Gets the active view.
    pub fn view(&self) -> View {
        self.view
    }

    /// Gets the current status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Renders the active view.
    pub fn render(&self, frame: &mut Frame) {
        match self.view {
            View::Game => {
                let snapshot = self.snapshots.borrow();
                ui::draw_game(frame, &snapshot, &self.status, self.player.as_ref());
            }
            View::Leaderboard => ui::draw_leaderboard(
                frame,
                &self.board,
                self.player.as_ref().map(|p| p.id().as_str()),
            ),
        }
    }

    /// Advances timers and picks up asynchronous results.
    pub async fn tick(&mut self, clock: &dyn Clock) {
        self.session.advance(clock);
        self.observe_screen();

        while let Ok(notice) = self.notices_rx.try_recv() {
            debug!(%notice, "Notice received");
            self.status = notice;
        }

        let update = self.subscription.as_mut().and_then(|s| s.try_next());
        if let Some(entries) = update {
            debug!(count = entries.len(), "Leaderboard update");
            self.board.entries = entries;
            self.board.state = BoardState::Ready;
            self.refresh_rank().await;
        }
    }

    /// Handles a key press. Returns false when the user quits.
    #[instrument(skip(self))]
    pub async fn handle_key(&mut self, key: KeyCode) -> bool {
        let keep_running = match self.view {
            View::Game => self.handle_game_key(key).await,
            View::Leaderboard => self.handle_board_key(key).await,
        };
        self.observe_screen();
        keep_running
    }

    async fn handle_game_key(&mut self, key: KeyCode) -> bool {
        match game_action(key, self.session.screen(), self.session.palette()) {
            GameAction::Intent(intent) => self.session.dispatch(intent),
            GameAction::UndoLast => {
                if let Some(&prime) = self.session.round().selected().last() {
                    self.session.dispatch(Intent::UndoPrime(prime));
                }
            }
            GameAction::ToggleMode => {
                let mode = self.session.game_mode().toggle();
                self.session.dispatch(Intent::SetMode(mode));
            }
            GameAction::OpenLeaderboard => {
                let mode = self.session.game_mode();
                self.open_leaderboard(mode).await;
            }
            GameAction::Quit => return false,
            GameAction::Ignore => {}
        }
        true
    }

    async fn handle_board_key(&mut self, key: KeyCode) -> bool {
        match board_action(key) {
            BoardAction::Back => self.close_leaderboard(),
            BoardAction::SwitchMode => {
                let mode = self.board.mode.toggle();
                self.open_leaderboard(mode).await;
            }
            BoardAction::Quit => return false,
            BoardAction::Ignore => {}
        }
        true
    }

    #[instrument(skip(self))]
    async fn open_leaderboard(&mut self, mode: GameMode) {
        self.view = View::Leaderboard;
        self.board = BoardView::loading(mode);
        if let Some(previous) = self.subscription.take() {
            previous.unsubscribe();
        }

        let Some(leaderboard) = &self.leaderboard else {
            self.board.state = BoardState::Unavailable("No leaderboard database".to_string());
            return;
        };

        match leaderboard.subscribe_top_n(mode, self.board_size).await {
            Ok(subscription) => {
                info!(%mode, "Leaderboard opened");
                self.subscription = Some(subscription);
            }
            Err(e) => {
                warn!(error = %e, "Leaderboard fetch failed");
                self.board.state = BoardState::Unavailable(e.message);
            }
        }
    }

    fn close_leaderboard(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.view = View::Game;
    }

    async fn refresh_rank(&mut self) {
        let (Some(leaderboard), Some(player)) = (&self.leaderboard, &self.player) else {
            return;
        };
        match leaderboard.rank_of(player.id(), self.board.mode).await {
            Ok(rank) => self.board.rank = Some(rank),
            Err(e) => warn!(error = %e, "Rank lookup failed"),
        }
    }

    fn observe_screen(&mut self) {
        let screen = self.session.screen();
        if screen == self.last_screen {
            return;
        }
        debug!(from = %self.last_screen, to = %screen, "Screen changed");
        self.last_screen = screen;
        if screen == Screen::GameOver {
            self.submit_final_score();
        }
    }

    /// Hands the finished game to the leaderboard without blocking play.
    fn submit_final_score(&mut self) {
        let Some(player) = &self.player else {
            self.status = "Game over. Sign in with --player to save scores".to_string();
            return;
        };
        let Some(leaderboard) = self.leaderboard.clone() else {
            self.status = "Game over. Leaderboard unavailable, score not saved".to_string();
            return;
        };
        let Some(submission) = self.session.score_submission(player) else {
            return;
        };

        self.status = "Saving score...".to_string();
        let notices = self.notices_tx.clone();
        tokio::spawn(async move {
            let notice = match leaderboard.submit_score(&submission).await {
                Ok(SubmitOutcome::Accepted(_)) => {
                    match leaderboard
                        .rank_of(submission.user_id(), *submission.mode())
                        .await
                    {
                        Ok(rank) => format!("New personal best! Rank {}", rank),
                        Err(e) => {
                            warn!(error = %e, "Rank lookup failed");
                            "New personal best!".to_string()
                        }
                    }
                }
                Ok(SubmitOutcome::NotPersonalBest) => {
                    "Not a personal best this time; nothing saved".to_string()
                }
                Err(e) => {
                    warn!(error = %e, "Score submission failed");
                    "Could not save score; your previous best is unchanged".to_string()
                }
            };
            // The app may already have quit.
            let _ = notices.send(notice);
        });
    }
}
