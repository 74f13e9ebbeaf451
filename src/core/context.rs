//! Handles shared by every agent of one run.

use std::sync::Arc;

use crate::config::Config;
use crate::core::clock::SimClock;
use crate::events::Bus;
use crate::policies::RandomSource;
use crate::store::{OperationArbiter, QueueStore};

/// Cheap-to-clone bundle of the shared simulation state.
#[derive(Clone)]
pub(crate) struct AgentContext {
    pub cfg: Arc<Config>,
    pub store: Arc<QueueStore>,
    pub arbiter: Arc<OperationArbiter>,
    pub bus: Bus,
    pub clock: SimClock,
}

impl AgentContext {
    pub fn new(cfg: Arc<Config>, bus: Bus) -> Self {
        let store = Arc::new(QueueStore::new(cfg.registers, cfg.customers, bus.clone()));
        let arbiter = Arc::new(OperationArbiter::new(cfg.registers, bus.clone()));
        let clock = SimClock::new(cfg.unit);
        Self {
            cfg,
            store,
            arbiter,
            bus,
            clock,
        }
    }

    /// Random stream for one agent; distinct `stream`s never share a sequence.
    pub fn rng(&self, stream: u64) -> RandomSource {
        RandomSource::new(self.cfg.seed, stream)
    }
}
