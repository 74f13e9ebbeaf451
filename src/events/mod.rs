//! Simulation events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to state changes emitted by the queue store, the
//! operation arbiter, the agents and the driver.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `QueueStore`, `OperationArbiter`, `CashierAgent`,
//!   `SimulationDriver`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the driver's listener (updates `AliveTracker`, fans out to
//!   `SubscriberSet`), or any receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
