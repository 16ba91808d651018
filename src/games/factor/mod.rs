mod generator;
mod invariants;
mod number_theory;
mod round;
mod types;

pub use generator::{ScriptedTargets, TargetGenerator, TargetSource};
pub use invariants::{ProductConsistent, QuotientConsistent};
pub use number_theory::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PALETTE, DEFAULT_PRIME_PROBABILITY, FALLBACK_COMPOSITE,
    LARGE_PRIMES, Palette, generate_composite, generate_large_prime, generate_target,
    is_factorizable_over, is_prime, product,
};
pub use round::{MoveOutcome, Round};
pub use types::{GameMode, GameSnapshot, Scores, Screen, Target};
