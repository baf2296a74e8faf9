//! # Car: one arriving unit.
//!
//! ```text
//! wait BoardingSlots ──(cancellable)──► board ──► wait UnboardSignal ──► disembark
//!                                         │
//!                                         └─ Refused (loading closed) ─► done
//! ```
//!
//! ## Rules
//! - Cancellation only applies while waiting for a boarding permit. A car that
//!   holds a permit runs the rest of its protocol to completion.
//! - Failures end this car only; they are returned to the supervisor, which logs them.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::ferry::{Boarding, Ferry};

/// Unique car identifier, assigned in arrival order. Used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarId(u64);

impl CarId {
    /// Wraps a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A car trying to cross.
pub struct Car {
    id: CarId,
    ferry: Arc<Ferry>,
}

impl Car {
    /// Creates a car bound for `ferry`.
    pub fn new(id: CarId, ferry: Arc<Ferry>) -> Self {
        Self { id, ferry }
    }

    /// This car's id.
    pub fn id(&self) -> CarId {
        self.id
    }

    /// Runs the boarding/transit/unboarding protocol once.
    ///
    /// Returns `Err(TaskError::Canceled)` if `token` fires before a boarding
    /// permit is granted, and `Ok(())` both for a completed crossing and for a
    /// car refused because loading closed under it.
    pub async fn run(self, token: CancellationToken) -> Result<(), TaskError> {
        tokio::select! {
            biased;
            res = self.ferry.wait_for_ticket() => match res {
                Ok(()) => {}
                Err(_) if token.is_cancelled() => return Err(TaskError::Canceled),
                Err(e) => return Err(e),
            },
            _ = token.cancelled() => return Err(TaskError::Canceled),
        }

        if let Boarding::Refused { .. } = self.ferry.board(self.id)? {
            return Ok(());
        }
        self.ferry.wait_to_unboard().await?;
        self.ferry.disembark(self.id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::{Clock, Config};
    use crate::events::Bus;
    use crate::ferry::Signal;

    fn ferry(capacity: usize) -> Arc<Ferry> {
        let cfg = Config {
            capacity,
            duration: Duration::from_secs(10),
            transit: Duration::from_secs(1),
            ..Config::default()
        };
        Ferry::new(&cfg, Bus::new(64), Clock::start())
    }

    #[tokio::test]
    async fn cancelled_before_boarding() {
        let ferry = ferry(2);
        let token = CancellationToken::new();
        let car = tokio::spawn(Car::new(CarId::new(1), ferry.clone()).run(token.clone()));
        tokio::task::yield_now().await;

        token.cancel();
        assert_eq!(car.await.unwrap(), Err(TaskError::Canceled));
        assert_eq!(ferry.occupancy().unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_signal_ends_only_this_car() {
        let ferry = ferry(2);
        let car = tokio::spawn(
            Car::new(CarId::new(4), ferry.clone()).run(CancellationToken::new()),
        );
        tokio::task::yield_now().await;

        ferry.close();
        assert_eq!(
            car.await.unwrap(),
            Err(TaskError::Signal {
                signal: Signal::BoardingSlots
            })
        );
    }

    #[tokio::test]
    async fn shutdown_close_reads_as_cancel() {
        let ferry = ferry(2);
        let token = CancellationToken::new();
        let car = tokio::spawn(Car::new(CarId::new(5), ferry.clone()).run(token.clone()));
        tokio::task::yield_now().await;

        token.cancel();
        ferry.close();
        assert_eq!(car.await.unwrap(), Err(TaskError::Canceled));
    }

    #[test]
    fn ids_order_and_display() {
        assert!(CarId::new(2) > CarId::new(1));
        assert_eq!(CarId::new(42).to_string(), "42");
        assert_eq!(CarId::new(7).get(), 7);
    }
}
