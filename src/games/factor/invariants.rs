//! Round invariants.
//!
//! Checked after every accepted selection or undo in debug builds.

use tracing::{instrument, warn};

use super::number_theory::product;
use super::round::Round;
use super::types::GameMode;

/// Invariant: the cached product equals the recomputed product of the selection.
pub struct ProductConsistent;

impl ProductConsistent {
    #[instrument(skip(round))]
    pub fn holds(round: &Round) -> bool {
        let expected = product(round.selected());
        let valid = round.product() == expected;
        if !valid {
            warn!(cached = round.product(), expected, "Product consistency violated");
        }
        valid
    }
}

/// Invariant (Simple mode): `intermediate * product == target`.
pub struct QuotientConsistent;

impl QuotientConsistent {
    #[instrument(skip(round))]
    pub fn holds(round: &Round) -> bool {
        if round.mode() != GameMode::Simple {
            return true;
        }
        let lhs = u64::from(round.intermediate()).saturating_mul(round.product());
        let target = u64::from(round.target().value);
        let valid = lhs == target;
        if !valid {
            warn!(
                intermediate = round.intermediate(),
                product = round.product(),
                target,
                "Quotient consistency violated"
            );
        }
        valid
    }
}

/// Asserts that all round invariants hold (panic on violation in debug builds).
pub fn assert_invariants(round: &Round) {
    debug_assert!(ProductConsistent::holds(round), "Product consistency violated");
    debug_assert!(QuotientConsistent::holds(round), "Quotient consistency violated");
}
