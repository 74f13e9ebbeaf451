//! # checkout
//!
//! **checkout** simulates a supermarket checkout: customers arrive at random
//! intervals and join the shortest open queue, cashiers serve their queue in
//! order and, after enough continuous work, take a break or hand the
//! register over to a new cashier. Only one register at a time may be in such
//! an operation.
//!
//! Every customer and every cashier is its own tokio task. They share two
//! components, a [`QueueStore`] and an [`OperationArbiter`], and report every
//! state change as an [`Event`] on a broadcast [`Bus`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌─────────────┐ ┌─────────────┐       ┌─────────────┐ ┌─────────────┐
//!   │ Customer #1 │ │ Customer #2 │  ...  │  Cashier #1 │ │  Cashier #N │
//!   └──────┬──────┘ └──────┬──────┘       └──┬───────┬──┘ └──┬───────┬──┘
//!          │ join shortest │                  │ serve │ ask  │       │
//!          ▼ open queue    ▼                  ▼       │ op   ▼       │
//! ┌──────────────────────────────────────────────┐   │ ┌──────────────────────┐
//! │ QueueStore                                   │   └►│ OperationArbiter     │
//! │ - one FIFO queue + open flag per register    │     │ - FIFO of requests   │
//! │ - remaining-customers counter                │     │ - at most one holder │
//! └──────────────────────┬───────────────────────┘     └──────────┬───────────┘
//!                        │ publish(Event)                         │
//!                        ▼                                        ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                       Bus (broadcast channel)                             │
//! └─────────────────────────────────────┬─────────────────────────────────────┘
//!                                       ▼
//!                           ┌───────────────────────┐
//!                           │   driver listener     │
//!                           └───┬───────────────┬───┘
//!                               ▼               ▼
//!                        AliveTracker     SubscriberSet
//!                                       ┌───────┼───────┐
//!                                       ▼       ▼       ▼
//!                                  LogWriter ServiceTally ...
//! ```
//!
//! ### Lifecycle
//! ```text
//! SimulationDriver::run(token)
//!   ├─► spawn CashierAgent per register
//!   ├─► for each customer: sleep(arrival) → spawn CustomerAgent
//!   ├─► cashier exits Replaced → publish CashierReplaced → spawn successor
//!   ├─► all cashiers Finished        → Outcome::Completed
//!   └─► token cancelled → ShutdownRequested → grace wait → Outcome::Cancelled
//!                                                         or RuntimeError::GraceExceeded
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types                                   |
//! |-------------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Shared state**  | Queues, open flags, operation slot                        | [`QueueStore`], [`OperationArbiter`]        |
//! | **Runtime**       | Agents, replacement of cashiers, graceful shutdown        | [`SimulationDriver`], [`SimulationReport`]  |
//! | **Notifications** | State changes as events, fanned out to subscribers        | [`Event`], [`Subscribe`], [`SubscriberSet`] |
//! | **Policies**      | Random windows, customer retries                          | [`UnitRange`], [`JoinPolicy`], [`BackoffPolicy`] |
//! | **Errors**        | Typed errors per component                                | [`QueueError`], [`ArbiterError`], [`RuntimeError`] |
//! | **Configuration** | All timings in simulated units                            | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use checkout::{Config, LogWriter, SimulationDriver, Subscribe, UnitRange};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         registers: 2,
//!         customers: 3,
//!         arrival: UnitRange::new(1, 3),
//!         service: UnitRange::new(5, 8),
//!         ack_delay: 1,
//!         closing_delay: 1,
//!         poll_interval: 1,
//!         unit: Duration::from_micros(200),
//!         seed: Some(42),
//!         ..Config::default()
//!     };
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!
//!     let sim = SimulationDriver::builder(cfg).with_subscribers(subs).build()?;
//!     let report = sim.run(&CancellationToken::new()).await?;
//!     println!("served {} customers", report.served);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{
    CashierExit, CashierState, Outcome, SimClock, SimulationBuilder, SimulationDriver, SimulationReport,
};
pub use error::{AgentError, ArbiterError, QueueError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, JoinPolicy, RandomSource, UnitRange};
pub use store::{CustomerId, OperationArbiter, OperationKind, QueueStore, RegisterId, RegisterStatus};
pub use subscribers::{LogWriter, ServiceTally, Subscribe, SubscriberSet, TallySnapshot};
