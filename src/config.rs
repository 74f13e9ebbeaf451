//! # Simulation configuration.
//!
//! Provides [`Config`] centralized settings for one simulation run.
//!
//! All durations except `unit` and `grace` are expressed in **simulated time
//! units**; one unit lasts `unit` of real time. The defaults reproduce the
//! reference store (1 unit = 1ms).
//!
//! ## Sentinel values
//! - `seed = None` → agents draw from OS-seeded random streams
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::error::RuntimeError;
use crate::policies::{JoinPolicy, UnitRange};

/// Configuration for a simulation run.
///
/// ## Field semantics
/// - `registers`: number of checkout registers N (`>= 1`)
/// - `customers`: number of customers M
/// - `arrival`: inter-arrival delay window between two customers
/// - `service`: per-customer service time window
/// - `unit`: real duration of one simulated unit
/// - `ack_delay`: pause before a cashier starts on the next customer
/// - `break_threshold`: continuous service time after which a cashier asks for an operation
/// - `break_duration` / `handoff_delay`: length of a break / a shift change handoff
/// - `closing_delay`: pause before a finished cashier marks its register idle
/// - `poll_interval`: longest an idle cashier sleeps before re-checking its queue (`>= 1`)
/// - `grace`: maximum wait for agents after cancellation
#[derive(Clone, Debug)]
pub struct Config {
    pub registers: usize,
    pub customers: usize,
    pub arrival: UnitRange,
    pub service: UnitRange,
    pub unit: Duration,
    pub ack_delay: u64,
    pub break_threshold: u64,
    pub break_duration: u64,
    pub handoff_delay: u64,
    pub closing_delay: u64,
    pub poll_interval: u64,
    pub grace: Duration,

    /// Capacity of the event bus ring buffer.
    ///
    /// Listeners lagging more than this many events skip the oldest ones.
    pub bus_capacity: usize,

    /// What customers do when every register is closed.
    pub join_policy: JoinPolicy,

    /// Seed for reproducible random streams.
    pub seed: Option<u64>,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks the preconditions the agents rely on.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        let reject = |reason: &str| {
            Err(RuntimeError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if self.registers == 0 {
            return reject("registers must be >= 1");
        }
        if u32::try_from(self.registers).is_err() || u32::try_from(self.customers).is_err() {
            return reject("registers and customers must fit in u32");
        }
        if !self.arrival.is_valid() {
            return reject("arrival.min must be <= arrival.max");
        }
        if !self.service.is_valid() {
            return reject("service.min must be <= service.max");
        }
        if self.poll_interval == 0 {
            return reject("poll_interval must be >= 1");
        }
        if self.unit.is_zero() {
            return reject("unit must be > 0");
        }
        Ok(())
    }
}

impl Default for Config {
    /// Reference store:
    ///
    /// - 3 registers, 20 customers
    /// - arrivals every 900..=3000 units, service 5000..=6000 units
    /// - 2000-unit acknowledgement delay and breaks, 1000-unit handoff and closing
    /// - operations requested after 6000 units of continuous service
    /// - 1 unit = 1ms, grace = 5s
    fn default() -> Self {
        Self {
            registers: 3,
            customers: 20,
            arrival: UnitRange::new(900, 3000),
            service: UnitRange::new(5000, 6000),
            unit: Duration::from_millis(1),
            ack_delay: 2000,
            break_threshold: 6000,
            break_duration: 2000,
            handoff_delay: 1000,
            closing_delay: 1000,
            poll_interval: 50,
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            join_policy: JoinPolicy::default(),
            seed: None,
        }
    }
}
