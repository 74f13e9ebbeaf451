//! # LogWriter: event logger
//!
//! A subscriber that writes every incoming [`Event`] through `tracing`.
//! Routine customer traffic goes to `debug`, register and cashier changes to
//! `info`, runtime trouble to `warn`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG checkout: joined customer=4 register=2 queue_len=3
//!  INFO checkout: status register=1 status="closed_draining"
//!  INFO checkout: operation granted register=1
//!  INFO checkout: cashier replaced register=3 cashier=5
//!  WARN checkout: grace exceeded
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "checkout";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let register = e.register.map(|r| r.get());
        let customer = e.customer.map(|c| c.get());
        let reason = e.reason.as_deref();
        match e.kind {
            EventKind::CustomerJoined => {
                debug!(target: TARGET, ?customer, ?register, queue_len = ?e.queue_len, "joined");
            }
            EventKind::CustomerAbandoned => {
                info!(target: TARGET, ?customer, ?reason, "abandoned");
            }
            EventKind::CustomerServeStarted => {
                debug!(target: TARGET, ?customer, ?register, cashier = ?e.cashier, "serving");
            }
            EventKind::CustomerServed => {
                debug!(target: TARGET, ?customer, ?register, units = ?e.units, "served");
            }
            EventKind::QueueReflowed => {
                debug!(target: TARGET, ?register, queue = ?e.queue.as_deref(), "reflow");
            }
            EventKind::RegisterStatusChanged => {
                let status = e.status.map(|s| s.as_label());
                info!(target: TARGET, ?register, ?status, "status");
            }
            EventKind::OperationRequested => {
                let operation = e.operation.map(|o| o.as_label());
                info!(target: TARGET, ?register, ?operation, "operation requested");
            }
            EventKind::OperationGranted => {
                info!(target: TARGET, ?register, "operation granted");
            }
            EventKind::OperationReleased => {
                info!(target: TARGET, ?register, "operation released");
            }
            EventKind::OperationCancelled => {
                info!(target: TARGET, ?register, "operation cancelled");
            }
            EventKind::CashierStarted => {
                info!(target: TARGET, ?register, cashier = ?e.cashier, "cashier started");
            }
            EventKind::CashierStopped => {
                info!(target: TARGET, ?register, cashier = ?e.cashier, ?reason, "cashier stopped");
            }
            EventKind::CashierReplaced => {
                info!(target: TARGET, ?register, cashier = ?e.cashier, "cashier replaced");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                warn!(target: TARGET, subscriber = ?e.subscriber, ?reason, kind = ?e.kind, "subscriber trouble");
            }
            EventKind::ShutdownRequested => {
                info!(target: TARGET, "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!(target: TARGET, "all agents stopped within grace");
            }
            EventKind::GraceExceeded => {
                warn!(target: TARGET, "grace exceeded");
            }
            EventKind::SimulationFinished => {
                info!(target: TARGET, "simulation finished");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
