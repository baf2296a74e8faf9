//! # The four permit signals.
//!
//! Each signal is a [`tokio::sync::Semaphore`] that starts with zero permits.
//! Posting adds permits, waiting acquires one and consumes it (the permit is
//! forgotten, never returned). Closing a signal wakes every waiter with an error.
//!
//! | Signal            | Posted by                   | Consumed by | Per cycle        |
//! |-------------------|-----------------------------|-------------|------------------|
//! | `BoardingSlots`   | controller (Loading)        | cars        | `capacity`       |
//! | `DepartureReady`  | car that fills the deck     | controller  | 1                |
//! | `UnboardSignal`   | controller (Unloading)      | cars        | cars aboard      |
//! | `EmptyReady`      | last car to leave           | controller  | 1                |

use std::fmt;

use tokio::sync::Semaphore;

/// Names one of the four permit signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Boarding permits, one per free slot.
    BoardingSlots,
    /// Deck is full.
    DepartureReady,
    /// Unboard permits, one per car aboard.
    UnboardSignal,
    /// Deck is empty.
    EmptyReady,
}

impl Signal {
    /// Returns a short stable label (snake_case).
    pub fn as_label(self) -> &'static str {
        match self {
            Signal::BoardingSlots => "boarding_slots",
            Signal::DepartureReady => "departure_ready",
            Signal::UnboardSignal => "unboard_signal",
            Signal::EmptyReady => "empty_ready",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Returned when a signal was closed before a permit became available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed(pub Signal);

/// The four semaphores shared by the controller and the cars.
#[derive(Debug)]
pub struct Signals {
    boarding: Semaphore,
    departure: Semaphore,
    unboard: Semaphore,
    empty: Semaphore,
}

impl Signals {
    /// Creates all four signals with no permits.
    pub fn new() -> Self {
        Self {
            boarding: Semaphore::new(0),
            departure: Semaphore::new(0),
            unboard: Semaphore::new(0),
            empty: Semaphore::new(0),
        }
    }

    fn get(&self, signal: Signal) -> &Semaphore {
        match signal {
            Signal::BoardingSlots => &self.boarding,
            Signal::DepartureReady => &self.departure,
            Signal::UnboardSignal => &self.unboard,
            Signal::EmptyReady => &self.empty,
        }
    }

    /// Adds `n` permits to `signal`.
    pub fn post(&self, signal: Signal, n: usize) {
        if n > 0 {
            self.get(signal).add_permits(n);
        }
    }

    /// Waits for one permit on `signal` and consumes it.
    ///
    /// Cancel safe: dropping the future before it resolves takes nothing.
    pub async fn wait(&self, signal: Signal) -> Result<(), Closed> {
        match self.get(signal).acquire().await {
            Ok(permit) => {
                permit.forget();
                Ok(())
            }
            Err(_closed) => Err(Closed(signal)),
        }
    }

    /// Withdraws up to `n` permits that nobody has taken yet. Returns how many were removed.
    pub fn withdraw(&self, signal: Signal, n: usize) -> usize {
        self.get(signal).forget_permits(n)
    }

    /// Permits currently available on `signal`.
    pub fn available(&self, signal: Signal) -> usize {
        self.get(signal).available_permits()
    }

    /// Closes every signal; current and future waiters get [`Closed`].
    pub fn close(&self) {
        self.boarding.close();
        self.departure.close();
        self.unboard.close();
        self.empty.close();
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn posted_permits_are_consumed() {
        let signals = Signals::new();
        signals.post(Signal::BoardingSlots, 2);
        signals.wait(Signal::BoardingSlots).await.unwrap();
        signals.wait(Signal::BoardingSlots).await.unwrap();
        assert_eq!(signals.available(Signal::BoardingSlots), 0);
        assert_eq!(signals.available(Signal::DepartureReady), 0);
    }

    #[tokio::test]
    async fn withdraw_takes_only_unclaimed() {
        let signals = Signals::new();
        signals.post(Signal::BoardingSlots, 3);
        signals.wait(Signal::BoardingSlots).await.unwrap();
        assert_eq!(signals.withdraw(Signal::BoardingSlots, 5), 2);
        assert_eq!(signals.available(Signal::BoardingSlots), 0);
    }

    #[tokio::test]
    async fn close_wakes_waiters() {
        let signals = std::sync::Arc::new(Signals::new());
        let waiter = {
            let signals = signals.clone();
            tokio::spawn(async move { signals.wait(Signal::UnboardSignal).await })
        };
        tokio::task::yield_now().await;
        signals.close();
        assert_eq!(
            waiter.await.unwrap(),
            Err(Closed(Signal::UnboardSignal))
        );
    }
}
