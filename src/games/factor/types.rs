//! Core domain types for the factoring game.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The screen currently shown to the player.
///
/// Exactly one screen is active at any time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Screen {
    /// Main menu.
    #[default]
    Main,
    /// Rules screen, reachable only from the main menu.
    HowToPlay,
    /// 3-2-1 countdown before play starts.
    Countdown,
    /// A timed game is running.
    Playing,
    /// The timer ran out.
    GameOver,
}

/// Factorization mode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    /// Multiply selected primes up toward the target.
    #[default]
    Normal,
    /// Divide the target down toward 1; only divisors are accepted.
    Simple,
}

impl GameMode {
    /// Returns the other mode.
    pub fn toggle(self) -> Self {
        match self {
            Self::Normal => Self::Simple,
            Self::Simple => Self::Normal,
        }
    }

    /// Returns the display label for this mode.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Simple => "Simple",
        }
    }
}

/// A round's target number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// The value the player has to reconstruct.
    pub value: u32,
    /// True iff `value` is prime (a "recognize the prime" round).
    pub is_prime: bool,
}

impl Target {
    /// A composite target, factorizable over the palette.
    pub fn composite(value: u32) -> Self {
        Self {
            value,
            is_prime: false,
        }
    }

    /// A prime target lying above the palette.
    pub fn prime(value: u32) -> Self {
        Self {
            value,
            is_prime: true,
        }
    }
}

/// Per-session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Getters)]
pub struct Scores {
    correct_factors: u32,
    undo_count: u32,
}

impl Scores {
    /// Creates a score pair.
    pub fn new(correct_factors: u32, undo_count: u32) -> Self {
        Self {
            correct_factors,
            undo_count,
        }
    }

    pub(crate) fn record_match(&mut self) {
        self.correct_factors = self.correct_factors.saturating_add(1);
    }

    pub(crate) fn record_undo(&mut self) {
        self.undo_count = self.undo_count.saturating_add(1);
    }
}

/// Read-only copy of the game state handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GameSnapshot {
    screen: Screen,
    game_mode: GameMode,
    round_mode: GameMode,
    target_number: u32,
    is_prime_target: bool,
    selected_primes: Vec<u32>,
    current_product: u64,
    current_intermediate: u32,
    round_resolved: bool,
    time_remaining: u32,
    countdown_value: u32,
    scores: Scores,
    palette: Vec<u32>,
}

impl GameSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        screen: Screen,
        game_mode: GameMode,
        round_mode: GameMode,
        target: Target,
        selected_primes: Vec<u32>,
        current_product: u64,
        current_intermediate: u32,
        round_resolved: bool,
        time_remaining: u32,
        countdown_value: u32,
        scores: Scores,
        palette: Vec<u32>,
    ) -> Self {
        Self {
            screen,
            game_mode,
            round_mode,
            target_number: target.value,
            is_prime_target: target.is_prime,
            selected_primes,
            current_product,
            current_intermediate,
            round_resolved,
            time_remaining,
            countdown_value,
            scores,
            palette,
        }
    }

    /// Formats the selection as an equation, e.g. `2 × 2 × 3 = 12`.
    ///
    /// Returns `None` when nothing has been selected yet.
    pub fn equation(&self) -> Option<String> {
        if self.selected_primes.is_empty() {
            return None;
        }
        let factors = self
            .selected_primes
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" × ");
        Some(format!("{} = {}", factors, self.current_product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_mode_round_trips_through_strings() {
        assert_eq!(GameMode::Normal.to_string(), "normal");
        assert_eq!(GameMode::from_str("simple").unwrap(), GameMode::Simple);
        assert!(GameMode::from_str("hard").is_err());
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(GameMode::Normal.toggle(), GameMode::Simple);
        assert_eq!(GameMode::Simple.toggle(), GameMode::Normal);
    }

    #[test]
    fn test_screen_names() {
        assert_eq!(Screen::HowToPlay.to_string(), "how_to_play");
        assert_eq!(Screen::default(), Screen::Main);
    }

    #[test]
    fn test_equation_formatting() {
        let snap = GameSnapshot::new(
            Screen::Playing,
            GameMode::Normal,
            GameMode::Normal,
            Target::composite(12),
            vec![2, 2, 3],
            12,
            12,
            true,
            60,
            0,
            Scores::default(),
            vec![2, 3],
        );
        assert_eq!(snap.equation().as_deref(), Some("2 × 2 × 3 = 12"));
    }
}
