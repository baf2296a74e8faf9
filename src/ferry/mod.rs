//! # Ferry: the transport controller.
//!
//! [`Ferry`] owns everything the cars synchronize on:
//! - the [`Deck`] (occupancy, behind the exclusive-access region),
//! - the four permit [`Signals`],
//! - the current [`Phase`], published on a `watch` channel.
//!
//! Cars never touch the counter directly. They go through four calls, in order:
//! ```text
//! Car ──► wait_for_ticket()   (BoardingSlots)
//!     ──► board()             (deck lock: +1, log "entered", post DepartureReady if full)
//!     ──► wait_to_unboard()   (UnboardSignal)
//!     ──► disembark()         (deck lock: -1, log "exited", post EmptyReady if empty)
//! ```
//! The controller side lives in [`controller`](self::controller): [`Ferry::run`]
//! drives the cycle until the deadline.

mod controller;
mod deck;
mod phase;
mod signals;

pub use controller::Voyage;
pub use deck::{Boarding, Deck, DeckError, DeckState, Landing};
pub use phase::Phase;
pub use signals::{Closed, Signal, Signals};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::core::{Clock, Config};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::CarId;

impl From<Closed> for TaskError {
    fn from(Closed(signal): Closed) -> Self {
        TaskError::Signal { signal }
    }
}

/// Shared synchronization state of one ferry.
///
/// Single writer for the phase (the controller loop), many readers.
pub struct Ferry {
    capacity: usize,
    duration: Duration,
    transit: Duration,
    clock: Clock,
    bus: Bus,
    deck: Deck,
    signals: Signals,
    phase: watch::Sender<Phase>,
}

impl Ferry {
    /// Creates a ferry from `cfg`. The config is expected to be validated already.
    pub fn new(cfg: &Config, bus: Bus, clock: Clock) -> Arc<Self> {
        let (phase, _rx) = watch::channel(Phase::default());
        Arc::new(Self {
            capacity: cfg.capacity,
            duration: cfg.duration,
            transit: cfg.transit,
            clock,
            bus,
            deck: Deck::new(cfg.capacity),
            signals: Signals::new(),
            phase,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver that observes every phase change.
    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// True while the ferry is loading.
    ///
    /// Advisory: a car that sees `true` may still miss this cycle. Only the
    /// boarding permit admits a car.
    pub fn is_accepting(&self) -> bool {
        self.phase().is_accepting()
    }

    /// False once the controller has stopped.
    pub fn is_running(&self) -> bool {
        !self.phase().is_terminal()
    }

    /// Cars currently aboard.
    pub fn occupancy(&self) -> Result<usize, TaskError> {
        Ok(self.deck.lock()?.occupancy())
    }

    /// Bus the ferry publishes on.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Closes all permit signals. Every waiter, car or controller, wakes with an error.
    pub fn close(&self) {
        self.signals.close();
    }

    /// Waits for a boarding permit.
    pub async fn wait_for_ticket(&self) -> Result<(), TaskError> {
        Ok(self.signals.wait(Signal::BoardingSlots).await?)
    }

    /// Registers `car` on the deck.
    ///
    /// The entered event and, for the car that fills the deck, the departure
    /// signal are both issued inside the exclusive-access region.
    pub fn board(&self, car: CarId) -> Result<Boarding, TaskError> {
        let mut deck = self.deck.lock()?;
        let outcome = deck.board(car)?;
        match outcome {
            Boarding::Boarded {
                cycle,
                occupancy,
                full,
            } => {
                self.bus.publish(
                    Event::new(EventKind::UnitEntered)
                        .with_unit(car)
                        .with_cycle(cycle)
                        .with_occupancy(occupancy),
                );
                if full {
                    self.signals.post(Signal::DepartureReady, 1);
                }
            }
            Boarding::Refused { cycle } => {
                self.bus.publish(
                    Event::new(EventKind::UnitTurnedAway)
                        .with_unit(car)
                        .with_cycle(cycle)
                        .with_reason("loading closed before the car registered"),
                );
            }
        }
        Ok(outcome)
    }

    /// Waits for an unboard permit.
    pub async fn wait_to_unboard(&self) -> Result<(), TaskError> {
        Ok(self.signals.wait(Signal::UnboardSignal).await?)
    }

    /// Deregisters `car`; the last car out signals the controller.
    pub fn disembark(&self, car: CarId) -> Result<Landing, TaskError> {
        let mut deck = self.deck.lock()?;
        let landing = deck.leave(car)?;
        self.bus.publish(
            Event::new(EventKind::UnitExited)
                .with_unit(car)
                .with_cycle(landing.cycle)
                .with_occupancy(landing.occupancy),
        );
        if landing.empty {
            self.signals.post(Signal::EmptyReady, 1);
        }
        Ok(landing)
    }
}
