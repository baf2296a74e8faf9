//! # ferryvisor
//!
//! **Ferryvisor** simulates a capacity-bounded ferry shuttling cars between two
//! docks. Cars arrive at random intervals, board until the deck is full, ride
//! across, unboard, and the cycle repeats until the run's time budget is spent.
//!
//! The interesting part is the synchronization: the ferry controller and the
//! cars coordinate only through four counting signals and one exclusive-access
//! region around the deck, so no car ever boards a ferry that is crossing and
//! the ferry never leaves with an empty slot.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐
//!     │   Arrivals   │  (one car every ArrivalPacing, while the ferry is loading)
//!     └──────┬───────┘
//!            ▼ mpsc
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (runtime orchestrator)                                │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - JoinSet of car tasks (reaped within the grace period)          │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               ▼
//!     ┌──────────┐       ┌──────────┐       ┌──────────┐   ┌──────────────┐
//!     │  Car #1  │       │  Car #2  │       │  Car #n  │   │ Ferry::run() │
//!     └────┬─────┘       └────┬─────┘       └────┬─────┘   └──────┬───────┘
//!          │   wait / post    │                  │                │
//!          ▼                  ▼                  ▼                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Ferry                                                            │
//! │  - Signals: BoardingSlots, DepartureReady, UnboardSignal,         │
//! │             EmptyReady                                            │
//! │  - Deck (occupancy, behind a mutex)                               │
//! │  - Phase (watch channel)                                          │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                    (capacity: Config::bus_capacity)               │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                          ┌────────┼────────┐
//!                          ▼        ▼        ▼
//!                      LogWriter  sub2     subN
//! ```
//!
//! ### Cycle
//! ```text
//! Controller                               Car
//! ──────────                               ───
//! Loading:  post BoardingSlots × capacity  wait BoardingSlots
//!                                          lock deck: +1, "entered"
//!                                          last one in: post DepartureReady
//! wait DepartureReady (or deadline)
//! Departing → InTransit: sleep(transit)
//! Unloading: post UnboardSignal × aboard   wait UnboardSignal
//!                                          lock deck: -1, "exited"
//!                                          last one out: post EmptyReady
//! wait EmptyReady
//! Draining → next cycle, or Stopped
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                |
//! |-------------------|-----------------------------------------------------------|-----------------------------------|
//! | **Ferry**         | Controller loop, deck, permit signals, phase table.       | [`Ferry`], [`Phase`], [`Signal`]  |
//! | **Tasks**         | Car tasks and the arrival generator.                      | [`Car`], [`Arrivals`]             |
//! | **Supervision**   | Runs the simulation, reaps every car before returning.    | [`Supervisor`]                    |
//! | **Subscriber API**| Hook into simulation events.                              | [`Subscribe`], [`LogWriter`]      |
//! | **Errors**        | Typed errors for the runtime and for single cars.         | [`RuntimeError`], [`TaskError`]   |
//! | **Configuration** | Capacity, duration, transit, pacing, limits.              | [`Config`], [`ArrivalPacing`]     |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ferryvisor::{ArrivalPacing, Clock, Config, LogWriter, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         capacity: 2,
//!         duration: Duration::from_millis(300),
//!         transit: Duration::from_millis(50),
//!         pacing: ArrivalPacing::fixed(Duration::from_millis(10)),
//!         handle_signals: false,
//!         ..Config::default()
//!     };
//!
//!     let clock = Clock::start();
//!     let sup = Supervisor::builder(cfg)
//!         .with_clock(clock)
//!         .with_subscriber(Arc::new(LogWriter::new(clock)))
//!         .build()?;
//!
//!     let voyage = sup.run().await?;
//!     println!("{} crossing(s), {} car(s) carried", voyage.crossings, voyage.carried);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod ferry;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{Clock, Config, Supervisor, SupervisorBuilder};
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use ferry::{Boarding, Closed, Deck, DeckError, Ferry, Landing, Phase, Signal, Signals, Voyage};
pub use policies::ArrivalPacing;
pub use subscribers::{LogWriter, Stream, Subscribe, SubscriberSet};
pub use tasks::{Arrivals, Car, CarId};
