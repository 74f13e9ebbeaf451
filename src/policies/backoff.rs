//! # Backoff policy for customers retrying to join.
//!
//! [`BackoffPolicy`] controls how long a customer waits (in simulated units)
//! before retrying after every register was closed. The wait for attempt `n`
//! is `first × factor^n`, clamped to `max`, then jittered. The base is derived
//! purely from the attempt number, so jitter never feeds back into later waits.
//!
//! # Example
//! ```rust
//! use checkout::{BackoffPolicy, JitterPolicy, RandomSource};
//!
//! let backoff = BackoffPolicy { first: 100, max: 10_000, factor: 2.0, jitter: JitterPolicy::None };
//! let mut rng = RandomSource::new(Some(1), 0);
//!
//! assert_eq!(backoff.next(0, &mut rng), 100);
//! assert_eq!(backoff.next(1, &mut rng), 200);
//! assert_eq!(backoff.next(10, &mut rng), 10_000);
//! ```

use crate::policies::jitter::JitterPolicy;
use crate::policies::range::RandomSource;

/// Retry backoff policy, in simulated time units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Wait before the first retry.
    pub first: u64,
    /// Maximum wait.
    pub max: u64,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 500-unit wait, capped at 5000, no jitter.
    fn default() -> Self {
        Self {
            first: 500,
            max: 5_000,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the wait for the given attempt number (0-indexed).
    pub fn next(&self, attempt: u32, rng: &mut RandomSource) -> u64 {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped = self.first as f64 * self.factor.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > self.max as f64 {
            self.max
        } else {
            unclamped as u64
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max, rng)
            }
            _ => self.jitter.apply(base, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(first: u64, max: u64, factor: f64, jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first,
            max,
            factor,
            jitter,
        }
    }

    #[test]
    fn exponential_growth_without_jitter() {
        let p = policy(100, 30_000, 2.0, JitterPolicy::None);
        let mut rng = RandomSource::new(Some(0), 0);
        let waits: Vec<u64> = (0..5).map(|n| p.next(n, &mut rng)).collect();
        assert_eq!(waits, vec![100, 200, 400, 800, 1600]);
    }

    #[test]
    fn constant_factor_stays_flat() {
        let p = BackoffPolicy::default();
        let mut rng = RandomSource::new(Some(0), 0);
        for attempt in 0..10 {
            assert_eq!(p.next(attempt, &mut rng), 500, "attempt {attempt}");
        }
    }

    #[test]
    fn first_above_max_is_clamped() {
        let p = policy(10_000, 5_000, 2.0, JitterPolicy::None);
        let mut rng = RandomSource::new(Some(0), 0);
        assert_eq!(p.next(0, &mut rng), 5_000);
    }

    #[test]
    fn huge_attempt_clamps_to_max() {
        let p = policy(100, 60_000, 2.0, JitterPolicy::None);
        let mut rng = RandomSource::new(Some(0), 0);
        assert_eq!(p.next(u32::MAX, &mut rng), 60_000);
    }

    #[test]
    fn equal_jitter_keeps_half_of_base() {
        let p = policy(1000, 30_000, 1.0, JitterPolicy::Equal);
        let mut rng = RandomSource::new(Some(3), 0);
        for attempt in 0..50 {
            let w = p.next(attempt, &mut rng);
            assert!((500..=1000).contains(&w), "attempt {attempt}: {w}");
        }
    }
}
