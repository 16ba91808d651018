//! The game session: screens, timers and per-game scoring.
//!
//! A [`Session`] is an explicit context value that owns the authoritative
//! game state. Presentation code forwards [`Intent`]s, drives time with
//! [`Session::advance`], and renders [`GameSnapshot`]s. Invalid actions are
//! silent no-ops; there is no error channel for gameplay input.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, Scheduler, TimerEvent, TimerId};
use crate::feedback::{Feedback, TracingFeedback};
use crate::games::factor::{
    GameMode, GameSnapshot, MoveOutcome, Palette, Round, Scores, Screen, TargetGenerator,
    TargetSource,
};
use crate::leaderboard::ScoreSubmission;
use crate::{GameConfig, PlayerIdentity};

const TICK: Duration = Duration::from_secs(1);

/// A raw player intent, forwarded unmodified from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Add a prime to the selection.
    SelectPrime(u32),
    /// Remove the last occurrence of a prime from the selection.
    UndoPrime(u32),
    /// Claim that the target is prime.
    RecognizePrime,
    /// Choose the mode for the next game.
    SetMode(GameMode),
    /// Start a fresh game with the countdown.
    StartCountdown,
    /// Open the rules screen.
    ShowHowToPlay,
    /// Abandon whatever is happening and go back to the menu.
    ReturnToMain,
}

/// One player's game: screen, timers, current round and scores.
pub struct Session {
    palette: Palette,
    round_seconds: u32,
    countdown_from: u32,
    go_delay: Duration,
    match_delay: Duration,

    targets: Box<dyn TargetSource>,
    feedback: Box<dyn Feedback>,
    scheduler: Scheduler,

    screen: Screen,
    mode: GameMode,
    round: Round,
    generation: u64,
    time_remaining: u32,
    countdown_value: u32,
    scores: Scores,

    countdown_timer: Option<TimerId>,
    go_timer: Option<TimerId>,
    round_timer: Option<TimerId>,
    advance_timer: Option<TimerId>,

    snapshots: watch::Sender<GameSnapshot>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("screen", &self.screen)
            .field("mode", &self.mode)
            .field("round", &self.round)
            .field("generation", &self.generation)
            .field("time_remaining", &self.time_remaining)
            .field("countdown_value", &self.countdown_value)
            .field("scores", &self.scores)
            .field("pending_timers", &self.scheduler.pending())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session with random targets and logging feedback.
    #[instrument(skip(config))]
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config,
            Box::new(TargetGenerator::from_config(config)),
            Box::new(TracingFeedback),
        )
    }

    /// Creates a session on the main menu with a fresh game prepared.
    #[instrument(skip_all)]
    pub fn new(
        config: &GameConfig,
        mut targets: Box<dyn TargetSource>,
        feedback: Box<dyn Feedback>,
    ) -> Self {
        let mode = GameMode::default();
        let round = Round::new(mode, targets.next_target());
        let snapshot = GameSnapshot::new(
            Screen::Main,
            mode,
            mode,
            round.target(),
            Vec::new(),
            1,
            round.intermediate(),
            false,
            *config.round_seconds(),
            *config.countdown_from(),
            Scores::default(),
            config.palette().primes().to_vec(),
        );
        let (snapshots, _rx) = watch::channel(snapshot);

        info!(target = round.target().value, "Creating session");
        Self {
            palette: config.palette().clone(),
            round_seconds: *config.round_seconds(),
            countdown_from: *config.countdown_from(),
            go_delay: config.go_delay(),
            match_delay: config.match_delay(),
            targets,
            feedback,
            scheduler: Scheduler::new(),
            screen: Screen::Main,
            mode,
            round,
            generation: 0,
            time_remaining: *config.round_seconds(),
            countdown_value: *config.countdown_from(),
            scores: Scores::default(),
            countdown_timer: None,
            go_timer: None,
            round_timer: None,
            advance_timer: None,
            snapshots,
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Read access
    // ─────────────────────────────────────────────────────────────

    /// Returns the active screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Returns the mode selected for the next game.
    pub fn game_mode(&self) -> GameMode {
        self.mode
    }

    /// Returns the current round.
    pub fn round(&self) -> &Round {
        &self.round
    }

    /// Returns the per-game counters.
    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Returns seconds left in the game.
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    /// Returns the countdown value.
    pub fn countdown_value(&self) -> u32 {
        self.countdown_value
    }

    /// Returns the selectable primes.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Returns the number of live timers.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Builds a read-only copy of the current state.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::new(
            self.screen,
            self.mode,
            self.round.mode(),
            self.round.target(),
            self.round.selected().to_vec(),
            self.round.product(),
            self.round.intermediate(),
            self.round.is_resolved(),
            self.time_remaining,
            self.countdown_value,
            self.scores,
            self.palette.primes().to_vec(),
        )
    }

    /// Subscribes to snapshots published after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshots.subscribe()
    }

    /// Returns the final counters once the game is over.
    pub fn final_scores(&self) -> Option<Scores> {
        (self.screen == Screen::GameOver).then_some(self.scores)
    }

    /// Builds the leaderboard submission for a finished game.
    ///
    /// Returns `None` unless the game is over.
    pub fn score_submission(&self, player: &PlayerIdentity) -> Option<ScoreSubmission> {
        self.final_scores()
            .map(|scores| ScoreSubmission::from_game(player, self.round.mode(), scores))
    }

    // ─────────────────────────────────────────────────────────────
    //  Screen transitions
    // ─────────────────────────────────────────────────────────────

    /// Routes a presentation intent to the matching operation.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::SelectPrime(p) => self.select_prime(p),
            Intent::UndoPrime(p) => self.undo_prime(p),
            Intent::RecognizePrime => self.handle_prime_recognition(),
            Intent::SetMode(mode) => self.set_game_mode(mode),
            Intent::StartCountdown => {
                self.new_game();
                self.start_countdown();
            }
            Intent::ShowHowToPlay => self.show_how_to_play(),
            Intent::ReturnToMain => self.return_to_main(),
        }
    }

    /// Prepares a fresh game: new target, empty selection, zeroed scores.
    ///
    /// Valid from `Main` or `GameOver`. Applies the selected mode.
    #[instrument(skip(self), fields(screen = %self.screen, mode = %self.mode))]
    pub fn new_game(&mut self) {
        if !matches!(self.screen, Screen::Main | Screen::GameOver) {
            debug!("new_game ignored outside Main/GameOver");
            return;
        }
        self.cancel_timers();
        self.reset_game();
        info!(target = self.round.target().value, "New game prepared");
        self.publish();
    }

    /// Starts the pre-game countdown. Valid from `Main` or `GameOver`.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn start_countdown(&mut self) {
        if !matches!(self.screen, Screen::Main | Screen::GameOver) {
            debug!("start_countdown ignored");
            return;
        }
        self.cancel_timers();
        self.screen = Screen::Countdown;
        self.countdown_value = self.countdown_from;
        self.countdown_timer = Some(
            self.scheduler
                .schedule_repeating(TICK, TimerEvent::CountdownTick),
        );
        info!(from = self.countdown_value, "Countdown started");
        self.publish();
    }

    /// Starts the timed game. Valid from `Countdown`.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn start_round(&mut self) {
        if self.screen != Screen::Countdown {
            debug!("start_round ignored outside Countdown");
            return;
        }
        self.cancel_timers();
        self.screen = Screen::Playing;
        self.time_remaining = self.round_seconds;
        self.round_timer = Some(self.scheduler.schedule_repeating(TICK, TimerEvent::RoundTick));
        info!(
            seconds = self.time_remaining,
            target = self.round.target().value,
            "Round started"
        );
        self.publish();
    }

    /// Stops the game clock and shows the results. Valid from `Playing`.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn end_game(&mut self) {
        if self.screen != Screen::Playing {
            debug!("end_game ignored outside Playing");
            return;
        }
        self.cancel_timers();
        self.screen = Screen::GameOver;
        info!(
            correct = self.scores.correct_factors(),
            undos = self.scores.undo_count(),
            "Game over"
        );
        self.publish();
    }

    /// Opens the rules screen. Valid from `Main`.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn show_how_to_play(&mut self) {
        if self.screen != Screen::Main {
            return;
        }
        self.screen = Screen::HowToPlay;
        self.publish();
    }

    /// Leaves any screen for the main menu, stopping all timers and
    /// preparing a fresh game.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn return_to_main(&mut self) {
        self.cancel_timers();
        self.screen = Screen::Main;
        self.reset_game();
        info!("Returned to main menu");
        self.publish();
    }

    /// Chooses the mode for the next game. Ignored while playing.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn set_game_mode(&mut self, mode: GameMode) {
        if self.screen == Screen::Playing {
            debug!("Mode change ignored while playing");
            return;
        }
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "Game mode changed");
            self.mode = mode;
            self.publish();
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Gameplay
    // ─────────────────────────────────────────────────────────────

    /// Adds a palette prime to the selection.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn select_prime(&mut self, prime: u32) {
        if self.screen != Screen::Playing || !self.palette.contains(prime) {
            return;
        }
        let outcome = self.round.select(prime);
        if outcome.is_applied() {
            self.feedback.on_select(prime);
        }
        self.after_move(outcome);
    }

    /// Removes the most recent occurrence of `prime` and counts an undo.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn undo_prime(&mut self, prime: u32) {
        if self.screen != Screen::Playing {
            return;
        }
        let outcome = self.round.undo(prime);
        if outcome.is_applied() {
            self.scores.record_undo();
            self.feedback.on_undo(prime);
        }
        self.after_move(outcome);
    }

    /// Claims the target is prime. Wrong claims cost nothing.
    #[instrument(skip(self), fields(screen = %self.screen))]
    pub fn handle_prime_recognition(&mut self) {
        if self.screen != Screen::Playing {
            return;
        }
        let outcome = self.round.recognize_prime();
        self.after_move(outcome);
    }

    // ─────────────────────────────────────────────────────────────
    //  Time
    // ─────────────────────────────────────────────────────────────

    /// Fires every timer due by the clock's current time.
    pub fn advance(&mut self, clock: &dyn Clock) {
        self.advance_to(clock.now());
    }

    /// Fires every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((id, event)) = self.scheduler.pop_due(now) {
            self.fire(id, event);
        }
        self.scheduler.settle(now);
    }

    #[instrument(skip(self), fields(screen = %self.screen))]
    fn fire(&mut self, id: TimerId, event: TimerEvent) {
        match event {
            TimerEvent::CountdownTick => self.on_countdown_tick(),
            TimerEvent::CountdownFinished => {
                self.go_timer = None;
                self.start_round();
            }
            TimerEvent::RoundTick => self.on_round_tick(),
            TimerEvent::AdvanceTarget { generation } => {
                if self.advance_timer == Some(id) {
                    self.advance_timer = None;
                }
                self.advance_target(generation);
            }
        }
    }

    fn on_countdown_tick(&mut self) {
        if self.screen != Screen::Countdown {
            warn!("Stale countdown tick ignored");
            return;
        }
        self.countdown_value = self.countdown_value.saturating_sub(1);
        debug!(value = self.countdown_value, "Countdown tick");
        if self.countdown_value == 0 {
            if let Some(id) = self.countdown_timer.take() {
                self.scheduler.cancel(id);
            }
            self.go_timer = Some(
                self.scheduler
                    .schedule_once(self.go_delay, TimerEvent::CountdownFinished),
            );
        }
        self.publish();
    }

    fn on_round_tick(&mut self) {
        if self.screen != Screen::Playing {
            warn!("Stale round tick ignored");
            return;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        debug!(remaining = self.time_remaining, "Round tick");
        self.publish();
        if self.time_remaining == 0 {
            self.end_game();
        }
    }

    fn advance_target(&mut self, generation: u64) {
        if self.screen != Screen::Playing || generation != self.generation {
            warn!(
                generation,
                current = self.generation,
                "Stale target advance ignored"
            );
            return;
        }
        self.next_round(self.round.mode());
        debug!(target = self.round.target().value, "Next target");
        self.publish();
    }

    // ─────────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────────

    fn after_move(&mut self, outcome: MoveOutcome) {
        match outcome {
            MoveOutcome::Rejected => {}
            MoveOutcome::Accepted => self.publish(),
            MoveOutcome::Matched => self.on_match(),
        }
    }

    fn on_match(&mut self) {
        self.scores.record_match();
        let target = self.round.target().value;
        info!(
            target,
            correct = self.scores.correct_factors(),
            "Target matched"
        );
        self.feedback.on_match(target);
        self.advance_timer = Some(self.scheduler.schedule_once(
            self.match_delay,
            TimerEvent::AdvanceTarget {
                generation: self.generation,
            },
        ));
        self.publish();
    }

    fn reset_game(&mut self) {
        self.next_round(self.mode);
        self.scores = Scores::default();
        self.time_remaining = self.round_seconds;
        self.countdown_value = self.countdown_from;
    }

    fn next_round(&mut self, mode: GameMode) {
        self.generation = self.generation.wrapping_add(1);
        self.round = Round::new(mode, self.targets.next_target());
    }

    fn cancel_timers(&mut self) {
        for id in [
            self.countdown_timer.take(),
            self.go_timer.take(),
            self.round_timer.take(),
            self.advance_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(id);
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
