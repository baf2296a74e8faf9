//! # Deck: the single owner of occupancy.
//!
//! [`DeckState`] is the occupancy counter plus the bookkeeping needed to check
//! it. Every mutation returns whether a threshold (full / empty) was crossed,
//! so "check count" and "signal" can never be split across two critical sections.
//!
//! [`Deck`] wraps the state in the exclusive-access region shared by all cars
//! and the controller.
//!
//! ## Rules
//! - `0 <= occupancy <= capacity`, always
//! - a car is aboard at most once, and only cars that are aboard may leave
//! - boarding requires an open deck; the controller closes it when loading ends
//! - `full` is reported exactly once per cycle, by the car that completes the count
//! - `empty` is reported exactly once per cycle, by the last car out

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::error::TaskError;
use crate::tasks::CarId;

/// Violation of a deck invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    /// A car tried to board a full deck.
    #[error("car {car} boarded a full deck (capacity {capacity})")]
    Overfull {
        /// Offending car.
        car: CarId,
        /// Deck capacity.
        capacity: usize,
    },

    /// A car tried to board while already aboard.
    #[error("car {car} is already aboard")]
    AlreadyAboard {
        /// Offending car.
        car: CarId,
    },

    /// A car tried to leave without being aboard.
    #[error("car {car} is not aboard")]
    NotAboard {
        /// Offending car.
        car: CarId,
    },
}

impl From<DeckError> for TaskError {
    fn from(err: DeckError) -> Self {
        TaskError::Protocol {
            error: err.to_string(),
        }
    }
}

/// Result of a boarding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boarding {
    /// The car is now counted in `cycle`.
    Boarded {
        /// Cycle the car was counted in.
        cycle: u64,
        /// Occupancy after boarding.
        occupancy: usize,
        /// This car filled the deck.
        full: bool,
    },
    /// Loading ended before the car registered; it was not counted.
    Refused {
        /// Cycle that refused the car.
        cycle: u64,
    },
}

/// Result of leaving the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landing {
    /// Cycle the car was carried in.
    pub cycle: u64,
    /// Occupancy after leaving.
    pub occupancy: usize,
    /// This car was the last one out.
    pub empty: bool,
}

/// Occupancy and per-cycle bookkeeping.
#[derive(Debug, Clone)]
pub struct DeckState {
    capacity: usize,
    cycle: u64,
    open: bool,
    aboard: BTreeSet<CarId>,
}

impl DeckState {
    /// Creates an empty, closed deck.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cycle: 0,
            open: false,
            aboard: BTreeSet::new(),
        }
    }

    /// Number of cars currently aboard.
    pub fn occupancy(&self) -> usize {
        self.aboard.len()
    }

    /// Current cycle number (0 before the first loading).
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// True while boarding registrations are accepted.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// True if `car` is aboard.
    pub fn is_aboard(&self, car: CarId) -> bool {
        self.aboard.contains(&car)
    }

    /// Opens the deck for `cycle`.
    pub fn open(&mut self, cycle: u64) {
        self.cycle = cycle;
        self.open = true;
    }

    /// Closes the deck to further registrations and returns the occupancy at that instant.
    pub fn close(&mut self) -> usize {
        self.open = false;
        self.occupancy()
    }

    /// Registers `car` as aboard.
    pub fn board(&mut self, car: CarId) -> Result<Boarding, DeckError> {
        if !self.open {
            return Ok(Boarding::Refused { cycle: self.cycle });
        }
        if self.is_aboard(car) {
            return Err(DeckError::AlreadyAboard { car });
        }
        if self.occupancy() >= self.capacity {
            return Err(DeckError::Overfull {
                car,
                capacity: self.capacity,
            });
        }
        self.aboard.insert(car);
        let occupancy = self.occupancy();
        Ok(Boarding::Boarded {
            cycle: self.cycle,
            occupancy,
            full: occupancy == self.capacity,
        })
    }

    /// Deregisters `car`.
    pub fn leave(&mut self, car: CarId) -> Result<Landing, DeckError> {
        if !self.aboard.remove(&car) {
            return Err(DeckError::NotAboard { car });
        }
        let occupancy = self.occupancy();
        Ok(Landing {
            cycle: self.cycle,
            occupancy,
            empty: occupancy == 0,
        })
    }
}

/// The exclusive-access region around [`DeckState`].
#[derive(Debug)]
pub struct Deck {
    state: Mutex<DeckState>,
}

impl Deck {
    /// Creates an empty, closed deck.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(DeckState::new(capacity)),
        }
    }

    /// Enters the exclusive-access region.
    ///
    /// Fails only if a previous holder panicked inside the region.
    pub fn lock(&self) -> Result<MutexGuard<'_, DeckState>, TaskError> {
        self.state.lock().map_err(|_poisoned| TaskError::Poisoned)
    }
}
