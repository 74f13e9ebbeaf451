use std::sync::Arc;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::subscribers::Subscribe;

use super::driver::SimulationDriver;

/// Builder for a [`SimulationDriver`].
pub struct SimulationBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SimulationBuilder {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets the event subscribers.
    ///
    /// Each subscriber gets its own worker and bounded queue, so a slow one
    /// never holds up the agents.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and creates the driver.
    ///
    /// Nothing is spawned until [`SimulationDriver::run`].
    pub fn build(self) -> Result<SimulationDriver, RuntimeError> {
        self.cfg.validate()?;
        Ok(SimulationDriver::new_internal(self.cfg, self.subscribers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let cfg = Config {
            registers: 0,
            ..Config::default()
        };
        let err = SimulationDriver::builder(cfg).build().err().unwrap();
        assert_eq!(err.as_label(), "runtime_invalid_config");
    }

    #[test]
    fn exposes_shared_state() {
        let sim = SimulationDriver::builder(Config::default()).build().unwrap();
        assert_eq!(sim.store().register_count(), 3);
        assert_eq!(sim.store().remaining_customers(), 20);
        assert!(sim.arbiter().pending().is_empty());
    }
}
