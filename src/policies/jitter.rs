//! # Jitter policy for retry waits.
//!
//! [`JitterPolicy`] adds randomness to backoff waits so that customers turned
//! away from a closed store do not all come back at the same instant.
//!
//! - [`JitterPolicy::None`]: exact waits
//! - [`JitterPolicy::Full`]: random wait in [0, wait]
//! - [`JitterPolicy::Equal`]: wait/2 + random[0, wait/2]
//! - [`JitterPolicy::Decorrelated`]: random[base, prev * 3], capped at max

use crate::policies::range::RandomSource;

/// Policy controlling randomization of retry waits (in simulated units).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// No jitter: use the exact backoff wait.
    #[default]
    None,

    /// Full jitter: random wait in [0, wait].
    Full,

    /// Equal jitter: wait/2 + random[0, wait/2].
    Equal,

    /// Decorrelated jitter: random[base, prev * 3], capped at max.
    ///
    /// Needs context via [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to the given wait.
    ///
    /// For `Decorrelated`, this returns the input unchanged.
    pub fn apply(&self, units: u64, rng: &mut RandomSource) -> u64 {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => units,
            JitterPolicy::Full => rng.between(0, units),
            JitterPolicy::Equal => {
                let half = units / 2;
                half + rng.between(0, half)
            }
        }
    }

    /// Applies decorrelated jitter with full context.
    ///
    /// Falls back to `apply(prev)` for the other variants.
    pub fn apply_decorrelated(&self, base: u64, prev: u64, max: u64, rng: &mut RandomSource) -> u64 {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev, rng);
        }
        let upper = prev.saturating_mul(3).min(max).max(base);
        rng.between(base, upper)
    }
}
