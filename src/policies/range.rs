//! # Bounded random durations.
//!
//! [`UnitRange`] describes an inclusive `[min, max]` window of simulated time
//! units; [`RandomSource`] draws from it. Each agent owns its own source, so no
//! RNG is shared across tasks.
//!
//! With a seed, every source is derived from `(seed, stream)`, which makes a
//! run reproducible as long as agents are given stable stream numbers.
//!
//! # Example
//! ```rust
//! use checkout::{RandomSource, UnitRange};
//!
//! let mut rng = RandomSource::new(Some(7), 1);
//! let service = UnitRange::new(5000, 6000);
//! let d = rng.sample(service);
//! assert!((5000..=6000).contains(&d));
//!
//! assert_eq!(RandomSource::new(None, 0).sample(UnitRange::fixed(42)), 42);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Inclusive range of simulated time units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitRange {
    pub min: u64,
    pub max: u64,
}

impl UnitRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Degenerate range that always yields `units`.
    pub const fn fixed(units: u64) -> Self {
        Self {
            min: units,
            max: units,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

/// Per-agent random stream.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// Derives a stream from `seed` and a per-agent `stream` number;
    /// without a seed the stream is seeded from the OS.
    pub fn new(seed: Option<u64>, stream: u64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Draws a value in `[range.min, range.max]`.
    ///
    /// An inverted range collapses to `min`.
    pub fn sample(&mut self, range: UnitRange) -> u64 {
        self.between(range.min, range.max)
    }

    /// Draws a value in `[lo, hi]`; returns `lo` when `lo >= hi`.
    pub fn between(&mut self, lo: u64, hi: u64) -> u64 {
        if lo >= hi {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_within_bounds() {
        let mut rng = RandomSource::new(Some(1), 0);
        let range = UnitRange::new(900, 3000);
        for _ in 0..500 {
            let v = rng.sample(range);
            assert!((900..=3000).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn same_seed_and_stream_repeat() {
        let range = UnitRange::new(0, 1_000_000);
        let mut a = RandomSource::new(Some(99), 3);
        let mut b = RandomSource::new(Some(99), 3);
        let xs: Vec<u64> = (0..16).map(|_| a.sample(range)).collect();
        let ys: Vec<u64> = (0..16).map(|_| b.sample(range)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn inverted_range_collapses_to_min() {
        let mut rng = RandomSource::new(None, 0);
        assert!(!UnitRange::new(10, 5).is_valid());
        assert_eq!(rng.sample(UnitRange::new(10, 5)), 10);
    }
}
