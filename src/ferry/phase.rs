//! # Ferry phases and the transition table.
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//! Draining ─► Loading ─► Departing ─► InTransit ─► Unloading ─► Draining
//!    │           │                                    ▲
//!    │           ├── deadline, cars aboard ───────────┘
//!    │           └── deadline, empty ──► Stopped
//!    └── deadline ──────────────────────► Stopped
//! ```
//!
//! A fresh ferry starts in `Draining`: empty and at the dock.

use std::fmt;

/// Phase of the ferry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Boarding permits are out; waiting for the deck to fill.
    Loading,
    /// Deck is full; leaving the dock.
    Departing,
    /// Crossing. No permits of either kind are being issued.
    InTransit,
    /// Unboard permits are out; waiting for the deck to empty.
    Unloading,
    /// Last car left; about to start the next cycle.
    Draining,
    /// Terminal. No further permits are ever issued.
    Stopped,
}

impl Phase {
    /// Returns `true` if `self → next` is a legal transition.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Draining, Loading)
                | (Draining, Stopped)
                | (Loading, Departing)
                | (Loading, Unloading)
                | (Loading, Stopped)
                | (Departing, InTransit)
                | (InTransit, Unloading)
                | (Unloading, Draining)
        )
    }

    /// True while the ferry is at the dock handing out boarding permits.
    ///
    /// Advisory only: the boarding permit is what actually admits a car.
    pub fn is_accepting(self) -> bool {
        matches!(self, Phase::Loading)
    }

    /// True once the ferry has stopped for good.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Stopped)
    }

    /// Returns a short stable label (snake_case).
    pub fn as_label(self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Departing => "departing",
            Phase::InTransit => "in_transit",
            Phase::Unloading => "unloading",
            Phase::Draining => "draining",
            Phase::Stopped => "stopped",
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Draining
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
