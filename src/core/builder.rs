use std::sync::Arc;

use super::{Clock, Config, supervisor::Supervisor};
use crate::{error::RuntimeError, events::Bus, subscribers::Subscribe};

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: Config,
    clock: Option<Clock>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            clock: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Uses `clock` as the run's time origin (share it with a [`LogWriter`](crate::LogWriter)).
    ///
    /// Defaults to a clock started at [`build`](Self::build).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validates the configuration and builds the supervisor.
    ///
    /// This is the setup gate: an invalid config fails here, before any task starts.
    pub fn build(self) -> Result<Supervisor, RuntimeError> {
        self.cfg.validate()?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let clock = self.clock.unwrap_or_else(Clock::start);
        Ok(Supervisor::new_internal(
            self.cfg,
            bus,
            clock,
            self.subscribers,
        ))
    }
}
