//! # Simulation events emitted by the store, the arbiter and the agents.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Customer events**: joined, abandoned, serve started, served
//! - **Register events**: status changes and queue reflows
//! - **Operation events**: break/shift-change requests and grants
//! - **Runtime events**: cashier lifecycle, subscriber health, shutdown
//!
//! The [`Event`] struct carries the optional metadata (register, customer,
//! status, ...) a presentation layer needs to render the change.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events published under the store lock are sequenced in mutation order.
//!
//! ## Example
//! ```rust
//! use checkout::{CustomerId, Event, EventKind, RegisterId};
//!
//! let ev = Event::new(EventKind::CustomerJoined)
//!     .with_customer(CustomerId::new(7))
//!     .with_register(RegisterId::new(2));
//!
//! assert_eq!(ev.kind, EventKind::CustomerJoined);
//! assert_eq!(ev.register, Some(RegisterId::new(2)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::store::{CustomerId, OperationKind, RegisterId, RegisterStatus};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of simulation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Customer events ===
    /// Customer appended to a register queue.
    ///
    /// Sets: `customer`, `register`, `queue_len` (after the join).
    CustomerJoined,

    /// Customer gave up without joining any queue.
    ///
    /// Sets: `customer`, `reason`.
    CustomerAbandoned,

    /// Cashier started serving the customer at the head of its queue.
    ///
    /// Sets: `customer`, `register`, `cashier`.
    CustomerServeStarted,

    /// Customer was served and left the queue.
    ///
    /// Sets: `customer`, `register`, `units` (service duration).
    CustomerServed,

    // === Register events ===
    /// Register changed its externally visible status.
    ///
    /// Sets: `register`, `status`.
    RegisterStatusChanged,

    /// Remaining customers of a register moved up one position.
    ///
    /// Sets: `register`, `queue` (ordered remaining ids).
    QueueReflowed,

    // === Operation events ===
    /// Cashier asked for a break or a shift change.
    ///
    /// Sets: `register`, `operation`.
    OperationRequested,

    /// Arbiter granted the single operation slot.
    ///
    /// Sets: `register`.
    OperationGranted,

    /// Operation slot released (operation completed).
    ///
    /// Sets: `register`.
    OperationReleased,

    /// Stale request dropped because its cashier terminated.
    ///
    /// Sets: `register`.
    OperationCancelled,

    // === Cashier lifecycle ===
    /// Cashier agent started working a register.
    ///
    /// Sets: `register`, `cashier`.
    CashierStarted,

    /// Cashier agent exited.
    ///
    /// Sets: `register`, `cashier`, `reason` (finished / replaced / cancelled / error label).
    CashierStopped,

    /// A fresh cashier took over a register after a shift change.
    ///
    /// Sets: `register`, `cashier` (the successor).
    CashierReplaced,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberOverflow,

    // === Runtime events ===
    /// Cancellation requested (explicit token cancel or OS signal).
    ShutdownRequested,

    /// All agents stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some agents did not stop in time.
    GraceExceeded,

    /// Last event of a run; listeners stop after delivering it.
    SimulationFinished,
}

/// Simulation event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    pub register: Option<RegisterId>,
    pub customer: Option<CustomerId>,
    /// Cashier instance number (1-based, replacements continue the count).
    pub cashier: Option<u32>,
    pub status: Option<RegisterStatus>,
    pub operation: Option<OperationKind>,
    /// Queue length after the change.
    pub queue_len: Option<usize>,
    /// Ordered queue contents (reflow events only).
    pub queue: Option<Arc<[CustomerId]>>,
    /// Simulated duration in time units.
    pub units: Option<u64>,
    /// Subscriber name (subscriber health events only).
    pub subscriber: Option<&'static str>,
    /// Human-readable reason (errors, exit causes, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            register: None,
            customer: None,
            cashier: None,
            status: None,
            operation: None,
            queue_len: None,
            queue: None,
            units: None,
            subscriber: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_register(mut self, register: RegisterId) -> Self {
        self.register = Some(register);
        self
    }

    #[inline]
    pub fn with_customer(mut self, customer: CustomerId) -> Self {
        self.customer = Some(customer);
        self
    }

    #[inline]
    pub fn with_cashier(mut self, cashier: u32) -> Self {
        self.cashier = Some(cashier);
        self
    }

    #[inline]
    pub fn with_status(mut self, status: RegisterStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = Some(operation);
        self
    }

    #[inline]
    pub fn with_queue_len(mut self, len: usize) -> Self {
        self.queue_len = Some(len);
        self
    }

    /// Attaches an ordered snapshot of a queue (also sets `queue_len`).
    #[inline]
    pub fn with_queue(mut self, queue: impl Into<Arc<[CustomerId]>>) -> Self {
        let queue = queue.into();
        self.queue_len = Some(queue.len());
        self.queue = Some(queue);
        self
    }

    #[inline]
    pub fn with_units(mut self, units: u64) -> Self {
        self.units = Some(units);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"));
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::SimulationFinished)
    }
}
