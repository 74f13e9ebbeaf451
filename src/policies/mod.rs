//! Timing and retry policies.
//!
//! ## Contents
//! - [`UnitRange`], [`RandomSource`] bounded random durations (arrivals, service)
//! - [`JoinPolicy`] what a customer does when every register is closed
//! - [`BackoffPolicy`] how retry waits evolve (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization of retry waits
//!
//! ## Defaults
//! - `JoinPolicy::Abandon`.
//! - `BackoffPolicy::default()` → first=500, factor=1.0 (constant), max=5000, jitter=None.

mod backoff;
mod jitter;
mod join;
mod range;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use join::JoinPolicy;
pub use range::{RandomSource, UnitRange};
