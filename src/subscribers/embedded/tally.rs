//! # ServiceTally: stateful run statistics
//!
//! Folds the event stream into counters a report (or a test) can read once the
//! run is over:
//!
//! - how many times each customer joined and was served,
//! - abandoned customers,
//! - per-register status history,
//! - operations granted and cashier replacements.
//!
//! Reads are **eventually consistent** while a run is in progress; after
//! [`SimulationDriver::run`](crate::SimulationDriver::run) returns, all events of the run
//! have been applied.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::store::{CustomerId, OperationKind, RegisterId, RegisterStatus};
use crate::subscribers::Subscribe;

#[derive(Debug, Default, Clone)]
struct Counters {
    joined: HashMap<CustomerId, u32>,
    served: HashMap<CustomerId, u32>,
    abandoned: Vec<CustomerId>,
    statuses: BTreeMap<RegisterId, Vec<RegisterStatus>>,
    requested: Vec<(RegisterId, OperationKind)>,
    grants: Vec<RegisterId>,
    replacements: usize,
    cashiers_started: usize,
}

/// Read-only copy of the tally.
#[derive(Debug, Default, Clone)]
pub struct TallySnapshot {
    pub joined: HashMap<CustomerId, u32>,
    pub served: HashMap<CustomerId, u32>,
    pub abandoned: Vec<CustomerId>,
    /// Status changes per register, in publish order.
    pub statuses: BTreeMap<RegisterId, Vec<RegisterStatus>>,
    /// Operation requests in publish order.
    pub requested: Vec<(RegisterId, OperationKind)>,
    /// Operation grants in publish order.
    pub grants: Vec<RegisterId>,
    pub replacements: usize,
    pub cashiers_started: usize,
}

impl TallySnapshot {
    /// Number of distinct customers served at least once.
    pub fn served_customers(&self) -> usize {
        self.served.len()
    }

    /// True if no customer was served more than once.
    pub fn served_at_most_once(&self) -> bool {
        self.served.values().all(|n| *n == 1)
    }

    /// How often `register` reported `status`.
    pub fn status_count(&self, register: RegisterId, status: RegisterStatus) -> usize {
        self.statuses
            .get(&register)
            .map_or(0, |h| h.iter().filter(|s| **s == status).count())
    }
}

/// Subscriber counting what happened during a run.
#[derive(Default)]
pub struct ServiceTally {
    state: RwLock<Counters>,
}

impl ServiceTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event.
    pub async fn update(&self, ev: &Event) {
        let mut st = self.state.write().await;
        match ev.kind {
            EventKind::CustomerJoined => {
                if let Some(c) = ev.customer {
                    *st.joined.entry(c).or_default() += 1;
                }
            }
            EventKind::CustomerServed => {
                if let Some(c) = ev.customer {
                    *st.served.entry(c).or_default() += 1;
                }
            }
            EventKind::CustomerAbandoned => {
                if let Some(c) = ev.customer {
                    st.abandoned.push(c);
                }
            }
            EventKind::RegisterStatusChanged => {
                if let (Some(r), Some(s)) = (ev.register, ev.status) {
                    st.statuses.entry(r).or_default().push(s);
                }
            }
            EventKind::OperationRequested => {
                if let (Some(r), Some(op)) = (ev.register, ev.operation) {
                    st.requested.push((r, op));
                }
            }
            EventKind::OperationGranted => {
                if let Some(r) = ev.register {
                    st.grants.push(r);
                }
            }
            EventKind::CashierReplaced => st.replacements += 1,
            EventKind::CashierStarted => st.cashiers_started += 1,
            _ => {}
        }
    }

    /// Copies the current counters.
    pub async fn snapshot(&self) -> TallySnapshot {
        let st = self.state.read().await.clone();
        TallySnapshot {
            joined: st.joined,
            served: st.served,
            abandoned: st.abandoned,
            statuses: st.statuses,
            requested: st.requested,
            grants: st.grants,
            replacements: st.replacements,
            cashiers_started: st.cashiers_started,
        }
    }
}

#[async_trait]
impl Subscribe for ServiceTally {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "ServiceTally"
    }

    fn queue_capacity(&self) -> usize {
        8192
    }
}
