//! # LogWriter: the simulation's log stream
//!
//! Prints the ferry's story to stdout, one line per event, stamped with the
//! run's [`Clock`]:
//! ```text
//! [Clock : 0.41] Car 1 entered the ferry
//! [Clock : 2.97] Car 5 entered the ferry
//! [Clock : 2.97] Ferry leaves the dock
//! [Clock : 5.97] Ferry arrives to new dock
//! [Clock : 5.97] Car 3 exited the ferry
//! ```
//! Failures and other diagnostics go to stderr:
//! ```text
//! [Clock : 4.10] Car 12 failed: signal closed: unboard_signal
//! [Clock : 60.00] Ferry stays at the dock (deadline reached)
//! ```
//! Bookkeeping events (loading started, car arrived, cycle drained) are not printed.

use async_trait::async_trait;

use crate::core::Clock;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Output stream of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Simulation events.
    Stdout,
    /// Diagnostics.
    Stderr,
}

/// Event writer subscriber.
pub struct LogWriter {
    clock: Clock,
}

impl LogWriter {
    /// Construct a new [`LogWriter`] stamping lines relative to `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    /// Renders `e` as a log line, or `None` if it is not printed.
    pub fn render(&self, e: &Event) -> Option<(Stream, String)> {
        let car = || e.unit.map_or_else(|| "?".to_string(), |id| id.to_string());
        let reason = || e.reason.as_deref().unwrap_or("unknown").to_string();

        let message = match e.kind {
            EventKind::UnitEntered => format!("Car {} entered the ferry", car()),
            EventKind::UnitExited => format!("Car {} exited the ferry", car()),
            EventKind::FerryDeparts => "Ferry leaves the dock".to_string(),
            EventKind::FerryArrives => "Ferry arrives to new dock".to_string(),
            EventKind::LoadingAborted => format!("Ferry stays at the dock ({})", reason()),
            EventKind::UnitFailed => format!("Car {} failed: {}", car(), reason()),
            EventKind::SpawnFailed => format!("Car {} could not arrive: {}", car(), reason()),
            EventKind::ControllerFailed => format!("Ferry controller failed: {}", reason()),
            EventKind::GraceExceeded => format!("Shutdown grace exceeded: {}", reason()),
            EventKind::ShutdownRequested => format!("Shutdown requested ({})", reason()),
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                format!("[ferryvisor] {}", reason())
            }
            EventKind::LoadingStarted
            | EventKind::CycleDrained
            | EventKind::SimulationStopped
            | EventKind::UnitArrived
            | EventKind::UnitTurnedAway
            | EventKind::AllStoppedWithin
            | EventKind::SimulationFinished => return None,
        };
        // Stdout carries only the four protocol lines.
        let stream = match e.kind {
            EventKind::UnitEntered
            | EventKind::UnitExited
            | EventKind::FerryDeparts
            | EventKind::FerryArrives => Stream::Stdout,
            _ => Stream::Stderr,
        };
        Some((stream, format!("{} {message}", self.clock.stamp(e.at))))
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match self.render(e) {
            Some((Stream::Stdout, line)) => println!("{line}"),
            Some((Stream::Stderr, line)) => eprintln!("{line}"),
            None => {}
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }

    fn queue_capacity(&self) -> usize {
        4096
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::tasks::CarId;

    #[tokio::test(start_paused = true)]
    async fn renders_protocol_lines() {
        let writer = LogWriter::new(Clock::start());
        tokio::time::advance(Duration::from_millis(2500)).await;

        let entered = Event::new(EventKind::UnitEntered).with_unit(CarId::new(3));
        assert_eq!(
            writer.render(&entered),
            Some((
                Stream::Stdout,
                "[Clock : 2.50] Car 3 entered the ferry".to_string()
            ))
        );
        assert_eq!(
            writer.render(&Event::new(EventKind::FerryDeparts)),
            Some((Stream::Stdout, "[Clock : 2.50] Ferry leaves the dock".to_string()))
        );
        assert_eq!(
            writer.render(&Event::new(EventKind::FerryArrives)),
            Some((
                Stream::Stdout,
                "[Clock : 2.50] Ferry arrives to new dock".to_string()
            ))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failures_go_to_stderr_and_bookkeeping_is_silent() {
        let writer = LogWriter::new(Clock::start());
        let failed = Event::new(EventKind::UnitFailed)
            .with_unit(CarId::new(8))
            .with_reason("deck lock poisoned");
        assert_eq!(
            writer.render(&failed),
            Some((
                Stream::Stderr,
                "[Clock : 0.00] Car 8 failed: deck lock poisoned".to_string()
            ))
        );
        let aborted = Event::new(EventKind::LoadingAborted).with_reason("deadline reached");
        assert_eq!(
            writer.render(&aborted),
            Some((
                Stream::Stderr,
                "[Clock : 0.00] Ferry stays at the dock (deadline reached)".to_string()
            ))
        );
        assert_eq!(writer.render(&Event::new(EventKind::LoadingStarted)), None);
        assert_eq!(writer.render(&Event::new(EventKind::SimulationFinished)), None);
    }
}
