//! Arrival policies.
//!
//! - [`ArrivalPacing`] random pause between two arrivals.

mod pacing;

pub use pacing::ArrivalPacing;
