//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the ferry and its supervisor.
//!
//! ## Sentinel values
//! - `max_units = 0` → unlimited live car tasks
//!
//! ## Validation
//! [`Config::validate`] is the setup gate: a config it rejects never starts a task.

use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::RuntimeError;
use crate::policies::ArrivalPacing;

/// Global configuration for a ferry run.
///
/// ## Field semantics
/// - `capacity`: cars per crossing (boarding permits per cycle)
/// - `duration`: simulated run time; checked at the top of every cycle
/// - `transit`: fixed crossing time, not cancellable
/// - `pacing`: pause between two arrivals
/// - `max_units`: live car task limit (`0` = unlimited)
/// - `spawn_queue`: hand-off queue between the arrival generator and the supervisor (min 1)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `grace`: how long the supervisor waits to reap cars after the ferry stops
/// - `handle_signals`: stop on SIGINT/SIGTERM/SIGQUIT/Ctrl-C
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of cars the ferry holds.
    pub capacity: usize,

    /// Total simulated time. No boarding permits are released once it has elapsed.
    pub duration: Duration,

    /// Crossing time.
    pub transit: Duration,

    /// Pause between two arrivals.
    pub pacing: ArrivalPacing,

    /// Maximum number of car tasks alive at once.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = arrivals beyond `n` live cars are skipped (`SpawnFailed`)
    pub max_units: usize,

    /// Capacity of the arrival hand-off queue.
    pub spawn_queue: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Maximum time to wait for car tasks after the ferry stops.
    pub grace: Duration,

    /// Listen for OS termination signals during the run.
    pub handle_signals: bool,
}

impl Config {
    /// Returns the live car limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` live cars
    #[inline]
    pub fn unit_limit(&self) -> Option<usize> {
        if self.max_units == 0 {
            None
        } else {
            Some(self.max_units)
        }
    }

    /// Returns the spawn queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn spawn_queue_clamped(&self) -> usize {
        self.spawn_queue.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Rejects configurations the ferry cannot run with.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.capacity == 0 {
            return Err(invalid("capacity must be at least 1"));
        }
        if self.capacity > Semaphore::MAX_PERMITS {
            return Err(invalid(format!(
                "capacity {} exceeds the permit limit {}",
                self.capacity,
                Semaphore::MAX_PERMITS
            )));
        }
        if !self.pacing.is_valid() {
            return Err(invalid(format!(
                "arrival pacing min {:?} exceeds max {:?}",
                self.pacing.min, self.pacing.max
            )));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> RuntimeError {
    RuntimeError::InvalidConfig {
        reason: reason.into(),
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `capacity = 5`
    /// - `duration = 60s`
    /// - `transit = 3s`
    /// - `pacing = 0s..=1s`
    /// - `max_units = 0` (unlimited)
    /// - `spawn_queue = 64`
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    /// - `handle_signals = true`
    fn default() -> Self {
        Self {
            capacity: 5,
            duration: Duration::from_secs(60),
            transit: Duration::from_secs(3),
            pacing: ArrivalPacing::default(),
            max_units: 0,
            spawn_queue: 64,
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
            handle_signals: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.capacity, 5);
        assert_eq!(cfg.unit_limit(), None);
    }

    #[test]
    fn zero_capacity_rejected() {
        let cfg = Config {
            capacity: 0,
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_config");
    }

    #[test]
    fn inverted_pacing_rejected() {
        let cfg = Config {
            pacing: ArrivalPacing {
                min: Duration::from_secs(2),
                max: Duration::from_secs(1),
            },
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sentinels_and_clamps() {
        let cfg = Config {
            max_units: 8,
            spawn_queue: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.unit_limit(), Some(8));
        assert_eq!(cfg.spawn_queue_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
