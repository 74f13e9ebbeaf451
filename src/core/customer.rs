//! # CustomerAgent: one arriving customer.
//!
//! Joins the shortest open queue. When every register is closed the
//! configured [`JoinPolicy`] decides: leave at once, or wait per the
//! [`BackoffPolicy`](crate::BackoffPolicy) and try again.
//!
//! ```text
//! attempt ──► join_shortest_open_queue()
//!               ├─► Ok(register)      → done
//!               └─► NoOpenRegister
//!                     ├─► retry allowed → sleep(backoff.next(n)) → attempt
//!                     └─► otherwise     → store.abandon() → done
//! ```

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::context::AgentContext;
use crate::error::{AgentError, QueueError};
use crate::policies::{JoinPolicy, RandomSource};
use crate::store::{CustomerId, RegisterId};

/// Offset keeping customer random streams apart from cashier streams.
const CUSTOMER_STREAM: u64 = 1 << 32;

pub(crate) struct CustomerAgent {
    ctx: AgentContext,
    id: CustomerId,
    rng: RandomSource,
}

impl CustomerAgent {
    pub fn new(ctx: AgentContext, id: CustomerId) -> Self {
        let rng = ctx.rng(CUSTOMER_STREAM + u64::from(id.get()));
        Self { ctx, id, rng }
    }

    /// Returns the register joined, or `None` if the customer gave up.
    pub async fn run(mut self, token: CancellationToken) -> Result<Option<RegisterId>, AgentError> {
        let policy = self.ctx.cfg.join_policy;
        let mut failures: u32 = 0;

        loop {
            match self.ctx.store.join_shortest_open_queue(self.id) {
                Ok(register) => return Ok(Some(register)),
                Err(QueueError::NoOpenRegister) => failures += 1,
                Err(e) => return Err(e.into()),
            }

            match policy {
                JoinPolicy::Retry { backoff, .. } if policy.allows_retry(failures) => {
                    let wait = backoff.next(failures - 1, &mut self.rng);
                    debug!(customer = %self.id, attempt = failures, wait, "every register closed, retrying");
                    self.ctx.clock.sleep(wait, &token).await?;
                }
                _ => {
                    self.ctx.store.abandon(self.id, "no_open_register");
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time;

    use crate::config::Config;
    use crate::events::Bus;
    use crate::policies::BackoffPolicy;

    fn ctx(join_policy: JoinPolicy) -> AgentContext {
        let cfg = Config {
            registers: 1,
            customers: 1,
            join_policy,
            ..Config::default()
        };
        AgentContext::new(Arc::new(cfg), Bus::new(64))
    }

    #[tokio::test]
    async fn joins_open_register() {
        let ctx = ctx(JoinPolicy::Abandon);
        let joined = CustomerAgent::new(ctx.clone(), CustomerId::new(1))
            .run(CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(joined, Some(RegisterId::new(1)));
        assert_eq!(ctx.store.remaining_customers(), 0);
    }

    #[tokio::test]
    async fn abandons_when_everything_is_closed() {
        let ctx = ctx(JoinPolicy::Abandon);
        ctx.store.set_open(RegisterId::new(1), false).unwrap();

        let joined = CustomerAgent::new(ctx.clone(), CustomerId::new(1))
            .run(CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(joined, None);
        assert_eq!(ctx.store.abandoned_count(), 1);
        assert_eq!(ctx.store.remaining_customers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_register_reopens() {
        let ctx = ctx(JoinPolicy::Retry {
            backoff: BackoffPolicy::default(),
            max_attempts: None,
        });
        let r1 = RegisterId::new(1);
        ctx.store.set_open(r1, false).unwrap();

        let handle = tokio::spawn(CustomerAgent::new(ctx.clone(), CustomerId::new(1)).run(CancellationToken::new()));
        time::sleep(Duration::from_millis(1_200)).await;
        ctx.store.set_open(r1, true).unwrap();

        assert_eq!(handle.await.unwrap().unwrap(), Some(r1));
        assert_eq!(ctx.store.abandoned_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_retry_gives_up() {
        let ctx = ctx(JoinPolicy::Retry {
            backoff: BackoffPolicy::default(),
            max_attempts: Some(3),
        });
        ctx.store.set_open(RegisterId::new(1), false).unwrap();

        let joined = CustomerAgent::new(ctx.clone(), CustomerId::new(1))
            .run(CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(joined, None);
        assert_eq!(ctx.store.abandoned_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_retry_wait() {
        let ctx = ctx(JoinPolicy::Retry {
            backoff: BackoffPolicy::default(),
            max_attempts: None,
        });
        ctx.store.set_open(RegisterId::new(1), false).unwrap();

        let token = CancellationToken::new();
        let handle = tokio::spawn(CustomerAgent::new(ctx.clone(), CustomerId::new(1)).run(token.clone()));
        time::sleep(Duration::from_millis(100)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), Err(AgentError::Canceled));
        assert_eq!(ctx.store.remaining_customers(), 1);
    }
}
