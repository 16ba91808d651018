//! Number theory helpers: primality, palette factorizability and target draws.
//!
//! Targets must always be solvable with the fixed prime palette, so every
//! composite draw is checked against [`is_factorizable_over`] before it is
//! handed to a round.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::types::Target;
use crate::ConfigError;

/// Primes the player can select by default.
pub const DEFAULT_PALETTE: [u32; 10] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29];

/// Primes above the default palette, used for prime-recognition rounds.
pub const LARGE_PRIMES: [u32; 15] = [31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97];

/// Returned when composite sampling exhausts its attempts (12 = 2 × 2 × 3).
pub const FALLBACK_COMPOSITE: u32 = 12;

/// Rejection-sampling budget for [`generate_composite`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// Share of rounds that ask the player to recognize a prime.
pub const DEFAULT_PRIME_PROBABILITY: f64 = 0.2;

/// Returns true iff `n` is prime. Trial division up to √n.
pub fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let n = u64::from(n);
    let mut divisor: u64 = 3;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Returns true iff every prime factor of `n` belongs to `palette`.
///
/// Divides `n` by each palette prime as often as possible and checks that
/// the residue is exactly 1. Zero is never factorizable; one trivially is.
pub fn is_factorizable_over(n: u32, palette: &Palette) -> bool {
    if n == 0 {
        return false;
    }
    let mut residue = n;
    for &prime in palette.primes() {
        while residue % prime == 0 {
            residue /= prime;
        }
    }
    residue == 1
}

/// Multiplies a selection together. The empty product is 1.
///
/// Saturates at `u64::MAX`; a saturated product can never equal a target.
pub fn product(factors: &[u32]) -> u64 {
    factors
        .iter()
        .fold(1u64, |acc, &factor| acc.saturating_mul(u64::from(factor)))
}

/// Draws a composite in `[min, max]` whose factors all lie in `palette`.
///
/// Falls back to [`FALLBACK_COMPOSITE`] after `max_attempts` rejections or
/// when the range is empty.
#[instrument(skip(rng, palette))]
pub fn generate_composite<R: Rng + ?Sized>(
    rng: &mut R,
    min: u32,
    max: u32,
    palette: &Palette,
    max_attempts: u32,
) -> u32 {
    if min > max {
        warn!(min, max, "Empty target range, using fallback composite");
        return FALLBACK_COMPOSITE;
    }

    for attempt in 0..max_attempts {
        let candidate = rng.random_range(min..=max);
        if !is_prime(candidate) && is_factorizable_over(candidate, palette) {
            debug!(candidate, attempt, "Composite accepted");
            return candidate;
        }
    }

    warn!(max_attempts, "Composite sampling exhausted, using fallback");
    FALLBACK_COMPOSITE
}

/// Picks a prime uniformly from `candidates`, or `None` if there are none.
pub fn generate_large_prime<R: Rng + ?Sized>(rng: &mut R, candidates: &[u32]) -> Option<u32> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.random_range(0..candidates.len())])
}

/// Draws the next round's target.
///
/// With probability `prime_probability` the target is a prime lying above
/// the palette (only solvable by recognizing it); otherwise it is a
/// composite from [`generate_composite`].
#[instrument(skip(rng, palette))]
pub fn generate_target<R: Rng + ?Sized>(
    rng: &mut R,
    min: u32,
    max: u32,
    palette: &Palette,
    prime_probability: f64,
) -> Target {
    let probability = prime_probability.clamp(0.0, 1.0);
    if rng.random_bool(probability) {
        let candidates = palette.large_primes();
        if let Some(prime) = generate_large_prime(rng, &candidates) {
            debug!(prime, "Prime target drawn");
            return Target::prime(prime);
        }
        warn!("No large primes above palette, drawing composite instead");
    }
    Target::composite(generate_composite(
        rng,
        min,
        max,
        palette,
        DEFAULT_MAX_ATTEMPTS,
    ))
}

/// Ascending list of distinct primes the player may select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct Palette(Vec<u32>);

impl Palette {
    /// Validates and wraps a list of primes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the list is empty, not strictly ascending,
    /// or contains a non-prime.
    #[instrument]
    pub fn new(primes: Vec<u32>) -> Result<Self, ConfigError> {
        if primes.is_empty() {
            return Err(ConfigError::new("Palette must not be empty".to_string()));
        }
        if let Some(bad) = primes.iter().find(|&&p| !is_prime(p)) {
            return Err(ConfigError::new(format!("Palette entry {} is not prime", bad)));
        }
        if primes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::new(
                "Palette must be strictly ascending".to_string(),
            ));
        }
        Ok(Self(primes))
    }

    /// Returns the primes in ascending order.
    pub fn primes(&self) -> &[u32] {
        &self.0
    }

    /// Returns true if `p` is selectable.
    pub fn contains(&self, p: u32) -> bool {
        self.0.binary_search(&p).is_ok()
    }

    /// Returns the largest palette prime.
    pub fn max(&self) -> u32 {
        self.0.last().copied().unwrap_or(0)
    }

    /// Returns the number of selectable primes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated palette.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the prime-recognition candidates lying strictly above the palette.
    pub fn large_primes(&self) -> Vec<u32> {
        let max = self.max();
        LARGE_PRIMES.iter().copied().filter(|&p| p > max).collect()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(DEFAULT_PALETTE.to_vec())
    }
}

impl TryFrom<Vec<u32>> for Palette {
    type Error = ConfigError;

    fn try_from(primes: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(primes)
    }
}

impl From<Palette> for Vec<u32> {
    fn from(palette: Palette) -> Self {
        palette.0
    }
}
