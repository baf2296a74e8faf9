//! # Arrivals: the car generator.
//!
//! Hands a new [`Car`] to the supervisor, pauses for [`ArrivalPacing`], repeats.
//! Between cars it waits on the ferry's phase channel until the ferry is
//! loading again, rather than polling a flag.
//!
//! The loading gate only paces arrivals. It is not what keeps cars off a
//! crossing ferry; the boarding permits do that. A car handed over just as
//! loading ends simply waits for the next cycle.
//!
//! ## Exit conditions
//! - ferry reached `Stopped` (or the controller is gone)
//! - `token` cancelled
//! - the supervisor dropped its receiving end

use std::sync::Arc;

use tokio::{sync::mpsc, time};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::ferry::Ferry;
use crate::policies::ArrivalPacing;
use crate::tasks::{Car, CarId};

/// Generates cars for one ferry.
pub struct Arrivals {
    ferry: Arc<Ferry>,
    pacing: ArrivalPacing,
    bus: Bus,
    next_id: u64,
}

impl Arrivals {
    /// Creates a generator; ids start at 1.
    pub fn new(ferry: Arc<Ferry>, pacing: ArrivalPacing, bus: Bus) -> Self {
        Self {
            ferry,
            pacing,
            bus,
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> CarId {
        let id = CarId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Runs until the ferry stops or `token` is cancelled.
    ///
    /// Returns the number of cars handed over.
    pub async fn run(mut self, tx: mpsc::Sender<Car>, token: CancellationToken) -> u64 {
        let mut phase = self.ferry.watch_phase();
        let mut handed_over = 0;

        loop {
            let open = tokio::select! {
                res = phase.wait_for(|p| p.is_accepting() || p.is_terminal()) => {
                    res.map(|p| !p.is_terminal()).unwrap_or(false)
                }
                _ = token.cancelled() => false,
            };
            if !open {
                break;
            }

            let car = Car::new(self.next_id(), self.ferry.clone());
            match tx.try_send(car) {
                Ok(()) => handed_over += 1,
                Err(mpsc::error::TrySendError::Full(car)) => {
                    self.bus.publish(
                        Event::new(EventKind::SpawnFailed)
                            .with_unit(car.id())
                            .with_reason("spawn queue full"),
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => break,
            }

            let pause = time::sleep(self.pacing.next_delay());
            tokio::pin!(pause);
            tokio::select! {
                _ = &mut pause => {}
                _ = token.cancelled() => break,
            }
        }
        handed_over
    }
}
