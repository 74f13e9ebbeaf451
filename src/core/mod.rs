//! Runtime core: agents and orchestration.
//!
//! The only public entry point is [`SimulationDriver`] (built through
//! [`SimulationBuilder`]).
//!
//! Internal modules:
//! - [`clock`]: scaled, cancellable sleeps;
//! - [`cashier`]: the cashier state machine;
//! - [`customer`]: one arriving customer;
//! - [`driver`]: spawns agents, replaces cashiers, handles shutdown;
//! - [`alive`]: tracks running cashiers for stuck-agent reports;
//! - [`shutdown`]: cross-platform termination signal handling.

mod alive;
mod builder;
mod cashier;
mod clock;
mod context;
mod customer;
mod driver;
mod shutdown;

pub use builder::SimulationBuilder;
pub use cashier::{CashierExit, CashierState};
pub use clock::SimClock;
pub use driver::{Outcome, SimulationDriver, SimulationReport};
