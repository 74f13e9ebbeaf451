//! # Simulated clock.
//!
//! [`SimClock`] turns simulated time units into real sleeps
//! (`units × unit`) and makes every sleep cancellable. It is the only place
//! agents suspend, so cancelling the run token stops every agent at its next
//! suspension point.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;

/// Scaled, cancellable sleeps.
#[derive(Clone, Copy, Debug)]
pub struct SimClock {
    unit: Duration,
}

impl SimClock {
    /// One simulated unit lasts `unit` of real time.
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// Real duration of `units` (saturating).
    #[inline]
    pub fn scaled(&self, units: u64) -> Duration {
        self.unit
            .saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
    }

    /// Sleeps `units`, or returns `Canceled` as soon as `token` fires.
    ///
    /// A zero-length sleep still yields once to the scheduler.
    pub async fn sleep(&self, units: u64, token: &CancellationToken) -> Result<(), AgentError> {
        if token.is_cancelled() {
            return Err(AgentError::Canceled);
        }
        if units == 0 {
            tokio::task::yield_now().await;
            return Ok(());
        }
        let sleep = time::sleep(self.scaled(units));
        tokio::pin!(sleep);
        select! {
            biased;
            _ = token.cancelled() => Err(AgentError::Canceled),
            _ = &mut sleep => Ok(()),
        }
    }

    /// Waits for `wake`, at most `units`; `Canceled` if `token` fires first.
    pub async fn wait_or_timeout<F>(
        &self,
        wake: F,
        units: u64,
        token: &CancellationToken,
    ) -> Result<(), AgentError>
    where
        F: Future<Output = ()>,
    {
        let sleep = time::sleep(self.scaled(units));
        tokio::pin!(sleep);
        select! {
            biased;
            _ = token.cancelled() => Err(AgentError::Canceled),
            _ = wake => Ok(()),
            _ = &mut sleep => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn sleep_scales_units() {
        let clock = SimClock::new(Duration::from_millis(2));
        let token = CancellationToken::new();
        let start = Instant::now();
        clock.sleep(500, &token).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let clock = SimClock::new(Duration::from_millis(1));
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let res = clock.sleep(60_000, &token).await;
        assert_eq!(res, Err(AgentError::Canceled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let clock = SimClock::new(Duration::from_millis(1));
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(clock.sleep(0, &token).await, Err(AgentError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_on_wake() {
        let clock = SimClock::new(Duration::from_millis(1));
        let token = CancellationToken::new();
        let start = Instant::now();
        clock
            .wait_or_timeout(async {}, 10_000, &token)
            .await
            .unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
