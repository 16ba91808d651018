//! Per-round selection bookkeeping for both factorization modes.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::invariants::assert_invariants;
use super::number_theory::product;
use super::types::{GameMode, Target};

/// Result of applying a player action to a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The action was ignored and nothing changed.
    Rejected,
    /// The action changed the selection.
    Accepted,
    /// The action changed the selection and solved the target.
    Matched,
}

impl MoveOutcome {
    /// Returns true if state changed.
    pub fn is_applied(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Selection state for one target.
///
/// In Normal mode the player builds `product` up toward the target. In
/// Simple mode the player divides `intermediate` down toward 1, and
/// `intermediate * product == target` holds after every accepted action.
///
/// Once solved, a round is resolved and ignores further actions until the
/// session replaces it with the next target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    mode: GameMode,
    target: Target,
    selected: Vec<u32>,
    product: u64,
    intermediate: u32,
    resolved: bool,
}

impl Round {
    /// Starts a round with an empty selection.
    #[instrument]
    pub fn new(mode: GameMode, target: Target) -> Self {
        Self {
            mode,
            target,
            selected: Vec::new(),
            product: 1,
            intermediate: target.value,
            resolved: false,
        }
    }

    /// Returns the mode this round is played in.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Returns the target.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Returns the selected primes in selection order.
    pub fn selected(&self) -> &[u32] {
        &self.selected
    }

    /// Returns the product of the selection.
    pub fn product(&self) -> u64 {
        self.product
    }

    /// Returns what is left to divide out (Simple mode).
    pub fn intermediate(&self) -> u32 {
        self.intermediate
    }

    /// Returns true once the target has been solved.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Returns true if the selection solves the target under the round's mode.
    pub fn is_solved(&self) -> bool {
        match self.mode {
            GameMode::Normal => self.product == u64::from(self.target.value),
            GameMode::Simple => self.intermediate == 1,
        }
    }

    /// Adds a prime to the selection.
    ///
    /// In Simple mode a prime that does not divide the intermediate value is
    /// silently rejected. Palette membership is checked by the caller.
    #[instrument(skip(self), fields(mode = %self.mode, target = self.target.value))]
    pub fn select(&mut self, prime: u32) -> MoveOutcome {
        if self.resolved || prime < 2 {
            return MoveOutcome::Rejected;
        }

        if self.mode == GameMode::Simple {
            if self.intermediate % prime != 0 {
                debug!(prime, intermediate = self.intermediate, "Prime does not divide");
                return MoveOutcome::Rejected;
            }
            self.intermediate /= prime;
        }

        self.selected.push(prime);
        self.product = product(&self.selected);
        assert_invariants(self);

        debug!(
            prime,
            product = self.product,
            intermediate = self.intermediate,
            "Prime selected"
        );
        self.settle()
    }

    /// Removes the most recent occurrence of `prime` from the selection.
    ///
    /// Rejected when the prime was never selected this round.
    #[instrument(skip(self), fields(mode = %self.mode, target = self.target.value))]
    pub fn undo(&mut self, prime: u32) -> MoveOutcome {
        if self.resolved {
            return MoveOutcome::Rejected;
        }
        let Some(index) = self.selected.iter().rposition(|&p| p == prime) else {
            debug!(prime, "Nothing to undo");
            return MoveOutcome::Rejected;
        };

        self.selected.remove(index);
        if self.mode == GameMode::Simple {
            self.intermediate = self.intermediate.saturating_mul(prime);
        }
        self.product = product(&self.selected);
        assert_invariants(self);

        debug!(
            prime,
            product = self.product,
            intermediate = self.intermediate,
            "Prime undone"
        );
        // Undoing an overshoot can land exactly on the target.
        self.settle()
    }

    /// Claims that the target is prime. Correct claims solve the round.
    #[instrument(skip(self), fields(target = self.target.value))]
    pub fn recognize_prime(&mut self) -> MoveOutcome {
        if self.resolved || !self.target.is_prime {
            return MoveOutcome::Rejected;
        }
        self.resolved = true;
        MoveOutcome::Matched
    }

    fn settle(&mut self) -> MoveOutcome {
        if self.is_solved() {
            self.resolved = true;
            MoveOutcome::Matched
        } else {
            MoveOutcome::Accepted
        }
    }
}
