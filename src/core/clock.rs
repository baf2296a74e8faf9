//! # Simulation clock.
//!
//! Every log line is stamped with seconds elapsed since the run started:
//! ```text
//! [Clock : 3.01] Ferry arrives to new dock
//! ```
//! Built on [`tokio::time::Instant`], so it is monotonic and follows paused
//! time in tests.

use std::time::Duration;

use tokio::time::Instant;

/// Origin of the run's elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    /// Starts a clock at the current instant.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Time elapsed since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.since_origin(Instant::now())
    }

    /// Time from the origin to `at`; never negative.
    pub fn since_origin(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.origin)
    }

    /// Instant `after` the origin.
    pub fn deadline(&self, after: Duration) -> Instant {
        self.origin + after
    }

    /// Log prefix for an instant: `[Clock : <seconds, 2 decimals>]`.
    pub fn stamp(&self, at: Instant) -> String {
        format!("[Clock : {:.2}]", self.since_origin(at).as_secs_f64())
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stamps_two_decimals() {
        let clock = Clock::start();
        assert_eq!(clock.stamp(Instant::now()), "[Clock : 0.00]");

        tokio::time::advance(Duration::from_millis(1506)).await;
        assert_eq!(clock.stamp(Instant::now()), "[Clock : 1.51]");
        assert_eq!(clock.elapsed(), Duration::from_millis(1506));
    }

    #[tokio::test(start_paused = true)]
    async fn never_negative() {
        let before = Instant::now();
        tokio::time::advance(Duration::from_secs(1)).await;
        let clock = Clock::start();
        assert_eq!(clock.since_origin(before), Duration::ZERO);
        assert_eq!(clock.stamp(before), "[Clock : 0.00]");
    }
}
