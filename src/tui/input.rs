//! Key bindings.
//!
//! Digits `1`..`0` pick the palette's primes in order; the row below them
//! (`q`..`p`) undoes the prime above it.

use crossterm::event::KeyCode;
use factor_rush::{Intent, Palette, Screen};

const SELECT_KEYS: [char; 10] = ['1', '2', '3', '4', '5', '6', '7', '8', '9', '0'];
const UNDO_KEYS: [char; 10] = ['q', 'w', 'e', 'r', 't', 'y', 'u', 'i', 'o', 'p'];

/// What a key press asks for while the game view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Forward to the session.
    Intent(Intent),
    /// Undo the most recently selected prime.
    UndoLast,
    /// Toggle the mode for the next game.
    ToggleMode,
    /// Show the leaderboard view.
    OpenLeaderboard,
    /// Leave the program.
    Quit,
    /// Nothing bound.
    Ignore,
}

/// What a key press asks for while the leaderboard view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardAction {
    /// Return to the game view.
    Back,
    /// Show the other mode's leaderboard.
    SwitchMode,
    /// Leave the program.
    Quit,
    /// Nothing bound.
    Ignore,
}

/// Returns the palette index bound to a selection key.
pub fn select_index(c: char) -> Option<usize> {
    SELECT_KEYS.iter().position(|&k| k == c)
}

/// Returns the palette index bound to an undo key.
pub fn undo_index(c: char) -> Option<usize> {
    UNDO_KEYS.iter().position(|&k| k == c)
}

/// Returns the key label shown next to the prime at `index`.
pub fn select_label(index: usize) -> Option<char> {
    SELECT_KEYS.get(index).copied()
}

/// Maps a key press on the game view.
pub fn game_action(key: KeyCode, screen: Screen, palette: &Palette) -> GameAction {
    match screen {
        Screen::Playing => playing_action(key, palette),
        Screen::Main => match key {
            KeyCode::Char('s') | KeyCode::Enter => GameAction::Intent(Intent::StartCountdown),
            KeyCode::Char('h') => GameAction::Intent(Intent::ShowHowToPlay),
            KeyCode::Char('m') | KeyCode::Tab => GameAction::ToggleMode,
            KeyCode::Char('l') => GameAction::OpenLeaderboard,
            KeyCode::Char('q') | KeyCode::Esc => GameAction::Quit,
            _ => GameAction::Ignore,
        },
        Screen::HowToPlay | Screen::Countdown => match key {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('q') => {
                GameAction::Intent(Intent::ReturnToMain)
            }
            _ => GameAction::Ignore,
        },
        Screen::GameOver => match key {
            KeyCode::Char('s') | KeyCode::Enter => GameAction::Intent(Intent::StartCountdown),
            KeyCode::Char('m') | KeyCode::Tab => GameAction::ToggleMode,
            KeyCode::Char('l') => GameAction::OpenLeaderboard,
            KeyCode::Esc | KeyCode::Char('q') => GameAction::Intent(Intent::ReturnToMain),
            _ => GameAction::Ignore,
        },
    }
}

fn playing_action(key: KeyCode, palette: &Palette) -> GameAction {
    let prime_at = |index: Option<usize>| index.and_then(|i| palette.primes().get(i).copied());
    match key {
        KeyCode::Char(c) => {
            if let Some(p) = prime_at(select_index(c)) {
                GameAction::Intent(Intent::SelectPrime(p))
            } else if let Some(p) = prime_at(undo_index(c)) {
                GameAction::Intent(Intent::UndoPrime(p))
            } else if c == ' ' {
                GameAction::Intent(Intent::RecognizePrime)
            } else {
                GameAction::Ignore
            }
        }
        KeyCode::Enter => GameAction::Intent(Intent::RecognizePrime),
        KeyCode::Backspace => GameAction::UndoLast,
        KeyCode::Esc => GameAction::Intent(Intent::ReturnToMain),
        _ => GameAction::Ignore,
    }
}

/// Maps a key press on the leaderboard view.
pub fn board_action(key: KeyCode) -> BoardAction {
    match key {
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('l') => BoardAction::Back,
        KeyCode::Tab | KeyCode::Char('m') => BoardAction::SwitchMode,
        KeyCode::Char('q') => BoardAction::Quit,
        _ => BoardAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_select_palette_primes() {
        let palette = Palette::default();
        assert_eq!(
            game_action(KeyCode::Char('1'), Screen::Playing, &palette),
            GameAction::Intent(Intent::SelectPrime(2))
        );
        assert_eq!(
            game_action(KeyCode::Char('0'), Screen::Playing, &palette),
            GameAction::Intent(Intent::SelectPrime(29))
        );
        assert_eq!(
            game_action(KeyCode::Char('w'), Screen::Playing, &palette),
            GameAction::Intent(Intent::UndoPrime(3))
        );
    }

    #[test]
    fn test_unbound_index_ignored_for_short_palette() {
        let palette = Palette::new(vec![2, 3, 5]).unwrap();
        assert_eq!(
            game_action(KeyCode::Char('4'), Screen::Playing, &palette),
            GameAction::Ignore
        );
        assert_eq!(
            game_action(KeyCode::Char('r'), Screen::Playing, &palette),
            GameAction::Ignore
        );
    }

    #[test]
    fn test_q_quits_only_from_main() {
        let palette = Palette::default();
        assert_eq!(
            game_action(KeyCode::Char('q'), Screen::Main, &palette),
            GameAction::Quit
        );
        assert_eq!(
            game_action(KeyCode::Char('q'), Screen::Playing, &palette),
            GameAction::Intent(Intent::UndoPrime(2))
        );
        assert_eq!(
            game_action(KeyCode::Char('q'), Screen::GameOver, &palette),
            GameAction::Intent(Intent::ReturnToMain)
        );
    }

    #[test]
    fn test_recognize_prime_keys() {
        let palette = Palette::default();
        for key in [KeyCode::Char(' '), KeyCode::Enter] {
            assert_eq!(
                game_action(key, Screen::Playing, &palette),
                GameAction::Intent(Intent::RecognizePrime)
            );
        }
    }
}
