//! # Controller loop: drives the ferry cycle.
//!
//! ```text
//! loop {
//!   ├─► deadline passed or shutdown? ─► Stopped, return Voyage
//!   ├─► Loading:   open deck, post `capacity` boarding permits
//!   │     wait DepartureReady ┬─ signalled ─► Departing ─► InTransit (sleep transit)
//!   │                         │                            └─► Unloading (post `capacity`)
//!   │                         └─ deadline/shutdown ─► close deck, withdraw permits
//!   │                                ├─ nobody aboard ─► Stopped, return Voyage
//!   │                                └─ k aboard      ─► Unloading (post k, no crossing)
//!   ├─► wait EmptyReady
//!   └─► Draining
//! }
//! ```
//!
//! ## Rules
//! - The deadline is checked at the top of every cycle, and bounds the loading wait.
//!   Transit and unloading are never cut short.
//! - Boarding and unboard permits are never outstanding together: unboard permits
//!   go out only after the deck is full (or closed), boarding permits only after
//!   it drained.
//! - Every phase change goes through the transition table; an illegal one is fatal.
//! - Any signal or lock failure here is fatal to the whole simulation.

use std::fmt::Display;
use std::sync::Arc;

use tokio::time;
use tokio_util::sync::CancellationToken;

use super::{Ferry, Phase, Signal};
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Voyage {
    /// Completed crossings.
    pub crossings: u64,
    /// Cars carried across.
    pub carried: u64,
    /// Loadings that ended without a full deck.
    pub aborted_loads: u64,
    /// The run was stopped by a shutdown request rather than the deadline.
    pub interrupted: bool,
}

/// How a loading phase ended.
enum Loaded {
    /// Deck filled; departure signal consumed.
    Full,
    /// Loading closed early with `aboard` cars on the deck.
    Aborted { aboard: usize },
}

impl Ferry {
    /// Runs the ferry until the deadline elapses (or `token` is cancelled).
    ///
    /// Returns the [`Voyage`] summary once the controller reaches
    /// [`Phase::Stopped`], or the error that made it give up.
    pub async fn run(self: Arc<Self>, token: CancellationToken) -> Result<Voyage, RuntimeError> {
        let mut voyage = Voyage::default();
        let mut cycle: u64 = 0;

        loop {
            if self.clock.elapsed() >= self.duration || token.is_cancelled() {
                voyage.interrupted = token.is_cancelled();
                self.stop(cycle)?;
                return Ok(voyage);
            }

            cycle += 1;
            let aboard = match self.load(cycle, &token).await? {
                Loaded::Full => {
                    self.depart(cycle)?;
                    time::sleep(self.transit).await;
                    self.bus.publish(
                        Event::new(EventKind::FerryArrives)
                            .with_cycle(cycle)
                            .with_occupancy(self.capacity),
                    );
                    voyage.crossings += 1;
                    voyage.carried += self.capacity as u64;
                    self.capacity
                }
                Loaded::Aborted { aboard: 0 } => {
                    voyage.aborted_loads += 1;
                    voyage.interrupted = token.is_cancelled();
                    self.stop(cycle)?;
                    return Ok(voyage);
                }
                Loaded::Aborted { aboard } => {
                    voyage.aborted_loads += 1;
                    aboard
                }
            };
            self.unload(cycle, aboard).await?;
        }
    }

    /// Moves to `next` if the transition table allows it.
    fn advance(&self, next: Phase) -> Result<(), RuntimeError> {
        let current = self.phase();
        if !current.can_transition_to(next) {
            return Err(fatal(
                current,
                format!("illegal transition {current} -> {next}"),
            ));
        }
        self.phase.send_replace(next);
        Ok(())
    }

    /// Opens the deck, releases `capacity` boarding permits and waits for a full deck.
    async fn load(&self, cycle: u64, token: &CancellationToken) -> Result<Loaded, RuntimeError> {
        self.advance(Phase::Loading)?;
        {
            // Published under the lock so it precedes every entered event of the cycle.
            let mut deck = self.deck.lock().map_err(|e| fatal(Phase::Loading, e))?;
            deck.open(cycle);
            self.bus.publish(
                Event::new(EventKind::LoadingStarted)
                    .with_cycle(cycle)
                    .with_occupancy(self.capacity),
            );
        }
        self.signals.post(Signal::BoardingSlots, self.capacity);

        let deadline = self.clock.deadline(self.duration);
        let reason = tokio::select! {
            biased;
            res = self.signals.wait(Signal::DepartureReady) => {
                res.map_err(|c| fatal(Phase::Loading, c.0))?;
                return Ok(Loaded::Full);
            }
            _ = time::sleep_until(deadline) => "deadline reached",
            _ = token.cancelled() => "shutdown requested",
        };
        self.abort_loading(cycle, reason).await
    }

    /// Ends a loading phase that did not fill up in time.
    ///
    /// Closing the deck and withdrawing unclaimed permits happen under the deck
    /// lock, so no car can register after the snapshot is taken.
    async fn abort_loading(&self, cycle: u64, reason: &str) -> Result<Loaded, RuntimeError> {
        let aboard = {
            let mut deck = self.deck.lock().map_err(|e| fatal(Phase::Loading, e))?;
            let aboard = deck.close();
            self.signals.withdraw(Signal::BoardingSlots, self.capacity);
            aboard
        };

        if aboard == self.capacity {
            // Filled up as the wait gave out; the departure signal is already posted.
            self.signals
                .wait(Signal::DepartureReady)
                .await
                .map_err(|c| fatal(Phase::Loading, c.0))?;
            return Ok(Loaded::Full);
        }

        self.bus.publish(
            Event::new(EventKind::LoadingAborted)
                .with_cycle(cycle)
                .with_occupancy(aboard)
                .with_reason(reason),
        );
        Ok(Loaded::Aborted { aboard })
    }

    /// Leaves the dock with a full deck.
    fn depart(&self, cycle: u64) -> Result<(), RuntimeError> {
        self.advance(Phase::Departing)?;
        let aboard = self
            .deck
            .lock()
            .map_err(|e| fatal(Phase::Departing, e))?
            .close();
        if aboard != self.capacity {
            return Err(fatal(
                Phase::Departing,
                format!("departure signalled with {aboard}/{} aboard", self.capacity),
            ));
        }
        self.bus.publish(
            Event::new(EventKind::FerryDeparts)
                .with_cycle(cycle)
                .with_occupancy(aboard),
        );
        self.advance(Phase::InTransit)
    }

    /// Releases one unboard permit per car aboard and waits for the deck to empty.
    async fn unload(&self, cycle: u64, aboard: usize) -> Result<(), RuntimeError> {
        self.advance(Phase::Unloading)?;
        self.signals.post(Signal::UnboardSignal, aboard);
        self.signals
            .wait(Signal::EmptyReady)
            .await
            .map_err(|c| fatal(Phase::Unloading, c.0))?;
        self.advance(Phase::Draining)?;
        self.bus
            .publish(Event::new(EventKind::CycleDrained).with_cycle(cycle));
        Ok(())
    }

    /// Terminal transition. No permits are issued after this.
    fn stop(&self, cycle: u64) -> Result<(), RuntimeError> {
        self.advance(Phase::Stopped)?;
        self.bus
            .publish(Event::new(EventKind::SimulationStopped).with_cycle(cycle));
        Ok(())
    }
}

fn fatal(phase: Phase, reason: impl Display) -> RuntimeError {
    RuntimeError::Controller {
        phase,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::broadcast;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::core::{Clock, Config};
    use crate::error::TaskError;
    use crate::events::Bus;
    use crate::ferry::Boarding;
    use crate::tasks::{Car, CarId};

    fn config(capacity: usize, duration: u64, transit: u64) -> Config {
        Config {
            capacity,
            duration: Duration::from_secs(duration),
            transit: Duration::from_secs(transit),
            bus_capacity: 4096,
            ..Config::default()
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    fn entered_in(events: &[Event], cycle: u64) -> Vec<u64> {
        let mut ids: Vec<u64> = events
            .iter()
            .filter(|e| e.kind == EventKind::UnitEntered && e.cycle == Some(cycle))
            .filter_map(|e| e.unit.map(CarId::get))
            .collect();
        ids.sort_unstable();
        ids
    }

    fn spawn_car(
        id: u64,
        ferry: &Arc<Ferry>,
        token: &CancellationToken,
    ) -> JoinHandle<Result<(), TaskError>> {
        let car = Car::new(CarId::new(id), ferry.clone());
        tokio::spawn(car.run(token.clone()))
    }

    #[tokio::test(start_paused = true)]
    async fn third_car_waits_for_next_cycle() {
        let cfg = config(2, 5, 1);
        let clock = Clock::start();
        let bus = Bus::new(cfg.bus_capacity);
        let mut rx = bus.subscribe();
        let ferry = Ferry::new(&cfg, bus, clock);
        let token = CancellationToken::new();

        let cars: Vec<_> = (1..=3)
            .map(|id| spawn_car(id, &ferry, &token))
            .collect();
        tokio::task::yield_now().await;

        let voyage = ferry.clone().run(token.clone()).await.unwrap();
        for car in cars {
            assert_eq!(car.await.unwrap(), Ok(()));
        }

        assert_eq!(voyage.crossings, 1);
        assert_eq!(voyage.carried, 2);
        assert_eq!(voyage.aborted_loads, 1);
        assert!(!voyage.interrupted);
        assert_eq!(ferry.phase(), Phase::Stopped);

        let events = drain(&mut rx);
        assert_eq!(entered_in(&events, 1), vec![1, 2]);
        assert_eq!(entered_in(&events, 2), vec![3]);

        let departs: Vec<&Event> = events
            .iter()
            .filter(|e| e.kind == EventKind::FerryDeparts)
            .collect();
        assert_eq!(departs.len(), 1);
        assert_eq!(clock.since_origin(departs[0].at), Duration::ZERO);

        let car3 = events
            .iter()
            .find(|e| e.kind == EventKind::UnitEntered && e.unit == Some(CarId::new(3)))
            .unwrap();
        assert_eq!(clock.since_origin(car3.at), Duration::from_secs(1));
        let last_exit_cycle1 = events
            .iter()
            .filter(|e| e.kind == EventKind::UnitExited && e.cycle == Some(1))
            .map(|e| e.seq)
            .max()
            .unwrap();
        assert!(car3.seq > last_exit_cycle1);

        // Car 3 was never carried: the deadline closed loading and it drove off at the dock.
        let aborted = events
            .iter()
            .find(|e| e.kind == EventKind::LoadingAborted)
            .unwrap();
        assert_eq!(aborted.cycle, Some(2));
        assert_eq!(aborted.occupancy, Some(1));
        assert_eq!(clock.since_origin(aborted.at), Duration::from_secs(5));
        assert!(events.iter().any(|e| {
            e.kind == EventKind::UnitExited && e.unit == Some(CarId::new(3)) && e.cycle == Some(2)
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_arrivals_still_stop_at_deadline() {
        let cfg = config(5, 5, 3);
        let clock = Clock::start();
        let bus = Bus::new(cfg.bus_capacity);
        let mut rx = bus.subscribe();
        let ferry = Ferry::new(&cfg, bus, clock);

        let voyage = ferry.clone().run(CancellationToken::new()).await.unwrap();

        assert_eq!(
            voyage,
            Voyage {
                crossings: 0,
                carried: 0,
                aborted_loads: 1,
                interrupted: false
            }
        );
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
        assert!(!ferry.is_running());

        let kinds: Vec<EventKind> = drain(&mut rx).into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::LoadingStarted,
                EventKind::LoadingAborted,
                EventKind::SimulationStopped
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn full_deck_crosses_then_stops_at_next_cycle_start() {
        let cfg = config(2, 2, 3);
        let clock = Clock::start();
        let bus = Bus::new(cfg.bus_capacity);
        let mut rx = bus.subscribe();
        let ferry = Ferry::new(&cfg, bus, clock);
        let token = CancellationToken::new();

        let cars: Vec<_> = (1..=2)
            .map(|id| spawn_car(id, &ferry, &token))
            .collect();
        let voyage = ferry.clone().run(token).await.unwrap();
        for car in cars {
            assert_eq!(car.await.unwrap(), Ok(()));
        }

        // Deadline (2s) passed mid-crossing; the crossing completes, no new loading.
        assert_eq!(voyage.crossings, 1);
        assert_eq!(voyage.aborted_loads, 0);
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
        let loadings = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::LoadingStarted)
            .count();
        assert_eq!(loadings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_loading() {
        let cfg = config(3, 60, 1);
        let ferry = Ferry::new(&cfg, Bus::new(64), Clock::start());
        let token = CancellationToken::new();

        let car = spawn_car(1, &ferry, &token);
        let controller = tokio::spawn(ferry.clone().run(token.clone()));
        time::sleep(Duration::from_secs(2)).await;
        assert!(ferry.is_accepting());
        assert_eq!(ferry.occupancy().unwrap(), 1);

        token.cancel();
        let voyage = controller.await.unwrap().unwrap();
        assert!(voyage.interrupted);
        assert_eq!(voyage.aborted_loads, 1);
        assert_eq!(car.await.unwrap(), Ok(()));
        assert_eq!(ferry.occupancy().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_signals_are_fatal_to_the_controller() {
        let cfg = config(2, 60, 1);
        let ferry = Ferry::new(&cfg, Bus::new(64), Clock::start());
        let controller = tokio::spawn(ferry.clone().run(CancellationToken::new()));
        tokio::task::yield_now().await;

        ferry.close();
        let err = controller.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Controller {
                phase: Phase::Loading,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn late_registration_is_refused_after_loading_closes() {
        let cfg = config(3, 1, 1);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let ferry = Ferry::new(&cfg, bus, Clock::start());

        let controller = tokio::spawn(ferry.clone().run(CancellationToken::new()));
        tokio::task::yield_now().await;
        // A car that holds a permit but has not registered when loading closes.
        ferry.wait_for_ticket().await.unwrap();
        let voyage = controller.await.unwrap().unwrap();
        assert_eq!(voyage.aborted_loads, 1);

        let late = ferry.board(CarId::new(9)).unwrap();
        assert_eq!(late, Boarding::Refused { cycle: 1 });
        assert_eq!(ferry.occupancy().unwrap(), 0);
        let turned_away = drain(&mut rx)
            .into_iter()
            .any(|e| e.kind == EventKind::UnitTurnedAway && e.unit == Some(CarId::new(9)));
        assert!(turned_away);
    }
}
