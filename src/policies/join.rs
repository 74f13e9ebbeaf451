//! # What a customer does when every register is closed.
//!
//! - [`JoinPolicy::Abandon`] the customer leaves immediately (default).
//! - [`JoinPolicy::Retry`] the customer waits per [`BackoffPolicy`] and tries
//!   again, abandoning after `max_attempts` (if set).
//!
//! An abandoned customer still counts down the remaining-customers counter, so
//! cashiers are never left waiting for someone who will not arrive.

use crate::policies::backoff::BackoffPolicy;

/// Policy applied by a customer agent on `NoOpenRegister`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum JoinPolicy {
    /// Give up on the first rejection.
    #[default]
    Abandon,
    /// Retry with backoff.
    ///   - `max_attempts: None` → retry until a register opens or the run is cancelled
    ///   - `Some(n)` → at most `n` attempts in total
    Retry {
        backoff: BackoffPolicy,
        max_attempts: Option<u32>,
    },
}

impl JoinPolicy {
    /// Whether another attempt is allowed after `attempts` failed ones.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        match self {
            JoinPolicy::Abandon => false,
            JoinPolicy::Retry { max_attempts, .. } => max_attempts.is_none_or(|max| attempts < max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandon_never_retries() {
        assert!(!JoinPolicy::Abandon.allows_retry(0));
    }

    #[test]
    fn bounded_retry_stops_at_limit() {
        let p = JoinPolicy::Retry {
            backoff: BackoffPolicy::default(),
            max_attempts: Some(3),
        };
        assert!(p.allows_retry(1));
        assert!(p.allows_retry(2));
        assert!(!p.allows_retry(3));
    }

    #[test]
    fn unbounded_retry_always_allows() {
        let p = JoinPolicy::Retry {
            backoff: BackoffPolicy::default(),
            max_attempts: None,
        };
        assert!(p.allows_retry(10_000));
    }
}
