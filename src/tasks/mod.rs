//! # Tasks driven against the ferry.
//!
//! - [`Car`] one arriving unit; boards, crosses, leaves
//! - [`CarId`] car identifier
//! - [`Arrivals`] generator that hands new cars to the supervisor

mod arrivals;
mod car;

pub use arrivals::Arrivals;
pub use car::{Car, CarId};
