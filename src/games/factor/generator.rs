//! Target sources for the session.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use super::number_theory::{Palette, generate_target};
use super::types::Target;
use crate::GameConfig;

/// Supplies the target for each new round.
pub trait TargetSource: Send {
    /// Returns the next round's target.
    fn next_target(&mut self) -> Target;
}

/// Random targets following the configured generation policy.
#[derive(Debug)]
pub struct TargetGenerator {
    palette: Palette,
    min: u32,
    max: u32,
    prime_probability: f64,
    rng: StdRng,
}

impl TargetGenerator {
    /// Creates a generator seeded from the operating system.
    #[instrument(skip(config))]
    pub fn from_config(config: &GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a deterministic generator.
    #[instrument(skip(config))]
    pub fn seeded(config: &GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &GameConfig, rng: StdRng) -> Self {
        Self {
            palette: config.palette().clone(),
            min: *config.target_min(),
            max: *config.target_max(),
            prime_probability: *config.prime_probability(),
            rng,
        }
    }
}

impl TargetSource for TargetGenerator {
    fn next_target(&mut self) -> Target {
        let target = generate_target(
            &mut self.rng,
            self.min,
            self.max,
            &self.palette,
            self.prime_probability,
        );
        debug!(value = target.value, is_prime = target.is_prime, "Generated target");
        target
    }
}

/// Replays a fixed list of targets, repeating the last one when exhausted.
///
/// Useful for practice drills and for deterministic tests.
#[derive(Debug, Clone)]
pub struct ScriptedTargets {
    queue: VecDeque<Target>,
    last: Target,
}

impl ScriptedTargets {
    /// Creates a script. An empty script yields 12 forever.
    pub fn new(targets: impl IntoIterator<Item = Target>) -> Self {
        let queue: VecDeque<Target> = targets.into_iter().collect();
        let last = queue
            .back()
            .copied()
            .unwrap_or(Target::composite(super::number_theory::FALLBACK_COMPOSITE));
        Self { queue, last }
    }
}

impl TargetSource for ScriptedTargets {
    fn next_target(&mut self) -> Target {
        self.queue.pop_front().unwrap_or(self.last)
    }
}
