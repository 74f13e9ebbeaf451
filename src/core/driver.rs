//! # SimulationDriver: spawns the agents of one run and waits for them.
//!
//! The driver owns the shared state (queue store, operation arbiter, event
//! bus), starts one [`CashierAgent`] per register, releases customers at
//! random intervals and supervises cashiers until all of them have finished.
//!
//! ## High-level architecture
//! ```text
//! run(token):
//!   listener: Bus.subscribe() ─► AliveTracker::update + SubscriberSet::emit
//!
//!   cashiers:  register 1..=N ──► CashierAgent(cashier i) ──► JoinSet
//!                                   exit Replaced ──► publish CashierReplaced
//!                                                     spawn CashierAgent(next id, takeover)
//!   customers: for i in 1..=M { sleep(arrival) ; spawn CustomerAgent(i) }
//!
//!   both loops done ─────────────► Outcome::Completed
//!   token cancelled ─────────────► publish ShutdownRequested
//!                                  wait_all_with_grace(cfg.grace):
//!                                    ├─ all joined → publish AllStoppedWithin → Outcome::Cancelled
//!                                    └─ timeout    → publish GraceExceeded
//!                                                    Err(GraceExceeded { stuck: AliveTracker.snapshot() })
//!
//!   publish SimulationFinished ──► listener drains subscribers and exits
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use checkout::{Config, Outcome, ServiceTally, SimulationDriver, Subscribe, UnitRange};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), checkout::RuntimeError> {
//!     let cfg = Config {
//!         registers: 2,
//!         customers: 4,
//!         arrival: UnitRange::fixed(1),
//!         service: UnitRange::fixed(5),
//!         ack_delay: 1,
//!         closing_delay: 1,
//!         poll_interval: 1,
//!         unit: Duration::from_micros(100),
//!         ..Config::default()
//!     };
//!     let tally = Arc::new(ServiceTally::new());
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![tally.clone()];
//!
//!     let sim = SimulationDriver::builder(cfg).with_subscribers(subs).build()?;
//!     let report = sim.run_until_signal().await?;
//!
//!     assert_eq!(report.outcome, Outcome::Completed);
//!     assert_eq!(report.served, 4);
//!     assert!(tally.snapshot().await.served_at_most_once());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::alive::{AliveTracker, cashier_name};
use crate::core::cashier::{CashierAgent, CashierExit};
use crate::core::context::AgentContext;
use crate::core::customer::CustomerAgent;
use crate::core::shutdown;
use crate::error::{AgentError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::store::{CustomerId, OperationArbiter, QueueStore, RegisterId};
use crate::subscribers::{Subscribe, SubscriberSet};

use super::builder::SimulationBuilder;

type CashierOutcome = (RegisterId, u32, Result<CashierExit, AgentError>);
type CustomerOutcome = (CustomerId, Result<Option<RegisterId>, AgentError>);

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every customer was served or gave up and every cashier finished.
    Completed,
    /// The run token was cancelled and every agent stopped within the grace period.
    Cancelled,
}

/// Summary of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationReport {
    pub outcome: Outcome,
    /// Cashier instances created, replacements included.
    pub cashiers_total: usize,
    pub served: usize,
    pub abandoned: usize,
    /// Customers still queued when the run ended (non-zero only after cancellation).
    pub left_in_queues: usize,
}

/// Runs one checkout simulation.
pub struct SimulationDriver {
    ctx: AgentContext,
    alive: Arc<AliveTracker>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    started: AtomicBool,
}

impl SimulationDriver {
    /// Starts building a driver for `cfg`.
    pub fn builder(cfg: Config) -> SimulationBuilder {
        SimulationBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            ctx: AgentContext::new(Arc::new(cfg), bus),
            alive: Arc::new(AliveTracker::new()),
            subscribers,
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.ctx.cfg
    }

    pub fn store(&self) -> Arc<QueueStore> {
        Arc::clone(&self.ctx.store)
    }

    pub fn arbiter(&self) -> Arc<OperationArbiter> {
        Arc::clone(&self.ctx.arbiter)
    }

    pub fn bus(&self) -> &Bus {
        &self.ctx.bus
    }

    /// Runs until every agent is done or `token` is cancelled.
    ///
    /// A driver runs once; later calls return `InvalidConfig`.
    pub async fn run(&self, token: &CancellationToken) -> Result<SimulationReport, RuntimeError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::InvalidConfig {
                reason: "simulation already ran".to_string(),
            });
        }
        let listener = self.spawn_listener();
        let run_token = token.child_token();

        let mut cashiers: JoinSet<CashierOutcome> = JoinSet::new();
        let mut customers: JoinSet<CustomerOutcome> = JoinSet::new();
        let mut next_cashier: u32 = 1;

        let finished = {
            let work = async {
                tokio::try_join!(
                    self.supervise_cashiers(&mut cashiers, &mut next_cashier, &run_token),
                    self.release_customers(&mut customers, &run_token),
                )
            };
            select! {
                biased;
                _ = token.cancelled() => None,
                res = work => Some(res),
            }
        };

        let res = match finished {
            Some(Ok(((), ()))) => Ok(Outcome::Completed),
            Some(Err(e)) => {
                warn!(error = %e, "agent failure, stopping the run");
                run_token.cancel();
                Err(e)
            }
            None => {
                self.ctx.bus.publish(Event::new(EventKind::ShutdownRequested));
                run_token.cancel();
                self.wait_all_with_grace(&mut cashiers, &mut customers)
                    .await
                    .map(|()| Outcome::Cancelled)
            }
        };

        let report = res.map(|outcome| self.report(outcome, next_cashier - 1));
        if let Ok(r) = &report {
            info!(
                outcome = ?r.outcome,
                cashiers = r.cashiers_total,
                served = r.served,
                abandoned = r.abandoned,
                left_in_queues = r.left_in_queues,
                "simulation finished"
            );
        }

        self.ctx.bus.publish(Event::new(EventKind::SimulationFinished));
        if let Err(e) = listener.await {
            warn!(error = %e, "event listener failed");
        }
        report
    }

    /// Runs until completion or until the process receives a termination signal.
    pub async fn run_until_signal(&self) -> Result<SimulationReport, RuntimeError> {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let watcher = tokio::spawn(async move {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(()) => trigger.cancel(),
                Err(e) => warn!(error = %e, "cannot listen for shutdown signals"),
            }
        });
        let res = self.run(&token).await;
        watcher.abort();
        res
    }

    /// Forwards bus events to the alive tracker and the subscribers until `SimulationFinished`.
    fn spawn_listener(&self) -> JoinHandle<()> {
        let mut rx = self.ctx.bus.subscribe();
        let alive = Arc::clone(&self.alive);
        let set = SubscriberSet::new(self.subscribers.clone(), self.ctx.bus.clone());

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        alive.update(&ev).await;
                        let last = ev.is_terminal();
                        set.emit(&ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }

    fn spawn_cashier(
        &self,
        set: &mut JoinSet<CashierOutcome>,
        register: RegisterId,
        cashier: u32,
        takeover: bool,
        token: &CancellationToken,
    ) {
        let agent = CashierAgent::new(self.ctx.clone(), register, cashier, takeover);
        let child = token.child_token();
        set.spawn(async move { (register, cashier, agent.run(child).await) });
    }

    /// Starts one cashier per register, then replaces handed-over cashiers until all are done.
    async fn supervise_cashiers(
        &self,
        set: &mut JoinSet<CashierOutcome>,
        next_cashier: &mut u32,
        token: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        for register in RegisterId::all(self.ctx.cfg.registers) {
            self.spawn_cashier(set, register, *next_cashier, false, token);
            *next_cashier += 1;
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((register, cashier, Ok(CashierExit::Replaced))) => {
                    let successor = *next_cashier;
                    *next_cashier += 1;
                    self.ctx.bus.publish(
                        Event::new(EventKind::CashierReplaced)
                            .with_register(register)
                            .with_cashier(successor)
                            .with_reason(format!("replaces cashier-{cashier}")),
                    );
                    self.spawn_cashier(set, register, successor, true, token);
                }
                Ok((_, _, Ok(_))) => {}
                Ok((register, cashier, Err(e))) => {
                    return Err(RuntimeError::AgentDied {
                        agent: cashier_name(cashier, register),
                        reason: e.as_message(),
                    });
                }
                Err(e) => {
                    return Err(RuntimeError::AgentDied {
                        agent: "cashier".to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Spawns the customers at random intervals and waits until each one has joined or left.
    async fn release_customers(
        &self,
        set: &mut JoinSet<CustomerOutcome>,
        token: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let mut rng = self.ctx.rng(0);
        for n in 1..=self.ctx.cfg.customers {
            let delay = rng.sample(self.ctx.cfg.arrival);
            if self.ctx.clock.sleep(delay, token).await.is_err() {
                return Ok(());
            }
            let id = CustomerId::new(u32::try_from(n).unwrap_or(u32::MAX));
            let agent = CustomerAgent::new(self.ctx.clone(), id);
            let child = token.child_token();
            set.spawn(async move { (id, agent.run(child).await) });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(_) | Err(AgentError::Canceled))) => {}
                Ok((id, Err(e))) => {
                    return Err(RuntimeError::AgentDied {
                        agent: id.to_string(),
                        reason: e.as_message(),
                    });
                }
                Err(e) => {
                    return Err(RuntimeError::AgentDied {
                        agent: "customer".to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Waits up to `cfg.grace` for every agent after cancellation.
    async fn wait_all_with_grace(
        &self,
        cashiers: &mut JoinSet<CashierOutcome>,
        customers: &mut JoinSet<CustomerOutcome>,
    ) -> Result<(), RuntimeError> {
        let grace = self.ctx.cfg.grace;
        let done = async {
            while cashiers.join_next().await.is_some() {}
            while customers.join_next().await.is_some() {}
        };

        match time::timeout(grace, done).await {
            Ok(()) => {
                self.ctx.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.ctx.bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = self.alive.snapshot().await;
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    fn report(&self, outcome: Outcome, cashiers_total: u32) -> SimulationReport {
        let store = &self.ctx.store;
        SimulationReport {
            outcome,
            cashiers_total: cashiers_total as usize,
            served: store.served_count(),
            abandoned: store.abandoned_count(),
            left_in_queues: store.queue_lengths().iter().sum(),
        }
    }
}
