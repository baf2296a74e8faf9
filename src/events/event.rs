//! # Runtime events emitted by the ferry, the cars and the supervisor.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Protocol events**: the ferry cycle and the cars moving through it
//! - **Arrival events**: cars arriving, being turned away, failing
//! - **Shutdown events**: stop, grace period, final event of a run
//! - **Subscriber events**: overflow and panics inside subscribers
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! `UnitEntered` and `UnitExited` are created and published inside the deck's
//! exclusive-access region, so their order on the bus is the order in which
//! occupancy changed.
//!
//! ## Example
//! ```rust
//! use ferryvisor::{CarId, Event, EventKind};
//!
//! let ev = Event::new(EventKind::UnitEntered)
//!     .with_unit(CarId::new(3))
//!     .with_cycle(1)
//!     .with_occupancy(2);
//!
//! assert_eq!(ev.kind, EventKind::UnitEntered);
//! assert_eq!(ev.unit, Some(CarId::new(3)));
//! assert_eq!(ev.occupancy, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use tokio::time::Instant;

use crate::tasks::CarId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Ferry cycle ===
    /// Controller opened the deck and released boarding permits.
    ///
    /// Sets: `cycle`, `occupancy` (permits released)
    LoadingStarted,

    /// A car registered on the deck.
    ///
    /// Sets: `unit`, `cycle`, `occupancy` (after boarding)
    UnitEntered,

    /// Deck is full, ferry leaves the dock.
    ///
    /// Sets: `cycle`, `occupancy`
    FerryDeparts,

    /// Ferry reached the other dock.
    ///
    /// Sets: `cycle`, `occupancy`
    FerryArrives,

    /// A car left the deck.
    ///
    /// Sets: `unit`, `cycle`, `occupancy` (after leaving)
    UnitExited,

    /// Last car left; cycle complete.
    ///
    /// Sets: `cycle`
    CycleDrained,

    /// Loading ended without a full deck (deadline or shutdown).
    ///
    /// Sets: `cycle`, `occupancy` (cars that will disembark at the dock), `reason`
    LoadingAborted,

    /// Controller reached its terminal phase.
    ///
    /// Sets: `cycle` (last cycle number)
    SimulationStopped,

    // === Arrivals ===
    /// A car task was admitted into the supervised set.
    ///
    /// Sets: `unit`
    UnitArrived,

    /// A car gave up without boarding (shutdown, or loading closed under it).
    ///
    /// Sets: `unit`, `reason`, optionally `cycle`
    UnitTurnedAway,

    /// A car task failed and terminated early.
    ///
    /// Sets: `unit`, `reason`
    UnitFailed,

    /// A car could not be spawned; the arrival is skipped.
    ///
    /// Sets: `unit`, `reason`
    SpawnFailed,

    // === Shutdown ===
    /// The controller failed; the simulation is torn down.
    ///
    /// Sets: `reason`
    ControllerFailed,

    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// All car tasks were reaped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining car tasks were aborted.
    ///
    /// Sets: `reason`
    GraceExceeded,

    /// Last event of a run. Subscribers are drained after it.
    SimulationFinished,

    // === Subscribers ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (subscriber name and panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber name and cause)
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: monotonic timestamp, rendered relative to the run's [`Clock`](crate::Clock)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Monotonic timestamp.
    pub at: Instant,
    /// Event classification.
    pub kind: EventKind,
    /// Car involved, if any.
    pub unit: Option<CarId>,
    /// Ferry cycle, if applicable.
    pub cycle: Option<u64>,
    /// Deck occupancy (or permit count) attached to the event.
    pub occupancy: Option<usize>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Instant::now(),
            kind,
            unit: None,
            cycle: None,
            occupancy: None,
            reason: None,
        }
    }

    /// Attaches a car id.
    #[inline]
    pub fn with_unit(mut self, unit: CarId) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Attaches a cycle number.
    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches an occupancy figure.
    #[inline]
    pub fn with_occupancy(mut self, occupancy: usize) -> Self {
        self.occupancy = Some(occupancy);
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
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// True for the last event of a run.
    #[inline]
    pub fn is_final(&self) -> bool {
        matches!(self.kind, EventKind::SimulationFinished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::FerryDeparts);
        let b = Event::new(EventKind::FerryArrives);
        assert!(b.seq > a.seq);
        assert!(b.at >= a.at);
    }

    #[test]
    fn classification() {
        assert!(Event::new(EventKind::SimulationFinished).is_final());
        assert!(!Event::new(EventKind::UnitFailed).is_final());
        let ev = Event::subscriber_overflow("log", "full");
        assert_eq!(ev.reason.as_deref(), Some("subscriber=log reason=full"));
    }
}
