//! # Supervisor: runs one ferry simulation end to end.
//!
//! The [`Supervisor`] owns the event bus, the subscribers and the run
//! configuration. It starts the ferry controller and the arrival generator,
//! spawns every arriving car into a supervised [`JoinSet`], and reaps them all
//! before returning.
//!
//! ## High-level architecture
//! ```text
//! run():
//!   subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   controller:  tokio::spawn(Ferry::run(child_token))
//!   generator:   tokio::spawn(Arrivals::run(spawn_tx, child_token))
//!
//! drive loop (select):
//!   ├─ controller finished        ─► leave loop with Voyage / RuntimeError
//!   ├─ spawn_rx.recv() → Car      ─► admit: limit check, UnitArrived, cars.spawn(car.run)
//!   ├─ cars.join_next()           ─► reap: Canceled → UnitTurnedAway, Err/panic → UnitFailed
//!   └─ OS signal                  ─► ShutdownRequested, runtime_token.cancel()
//!
//! teardown:
//!   runtime_token.cancel()  → generator exits, waiting cars give up
//!   ferry.close()           → any remaining waiter wakes with an error
//!   queued cars             → UnitTurnedAway
//!   wait_all_with_grace()   → AllStoppedWithin | GraceExceeded (abort the rest)
//!   SimulationFinished      → listener drains subscribers, run() returns
//! ```
//!
//! ## Rules
//! - Car failures never propagate: each is logged through the bus and the run continues.
//! - A controller failure ends the run with that error, after the cars are reaped.
//! - Every car task is joined or aborted before `run` returns; none are leaked.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::{Clock, Config, builder::SupervisorBuilder, shutdown};
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::ferry::{Ferry, Voyage};
use crate::subscribers::{Subscribe, SubscriberSet, panic_message};
use crate::tasks::{Arrivals, Car, CarId};

type CarOutcome = (CarId, Result<(), TaskError>);

/// Coordinates the ferry, the arrival generator, the cars and event delivery.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    clock: Clock,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Supervisor {
    /// Creates a builder for a supervisor with the given config.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    /// Creates a supervisor with the given config and subscribers.
    ///
    /// Fails if the config does not validate.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Result<Self, RuntimeError> {
        Self::builder(cfg).with_subscribers(subscribers).build()
    }

    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        clock: Clock,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        Self {
            cfg,
            bus,
            clock,
            subscribers,
        }
    }

    /// Event bus of this supervisor. Subscribe before [`run`](Self::run) to see every event.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Time origin of the run.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Runs the simulation until the ferry stops, then reaps all cars.
    pub async fn run(&self) -> Result<Voyage, RuntimeError> {
        let listener = self.subscriber_listener();
        let token = CancellationToken::new();

        let ferry = Ferry::new(&self.cfg, self.bus.clone(), self.clock);
        let (spawn_tx, mut spawn_rx) = mpsc::channel::<Car>(self.cfg.spawn_queue_clamped());
        let arrivals = Arrivals::new(Arc::clone(&ferry), self.cfg.pacing, self.bus.clone());
        let generator = tokio::spawn(arrivals.run(spawn_tx, token.child_token()));
        let mut controller = tokio::spawn(Arc::clone(&ferry).run(token.child_token()));
        let mut cars: JoinSet<CarOutcome> = JoinSet::new();

        let outcome = self
            .drive(&ferry, &mut controller, &mut spawn_rx, &mut cars, &token)
            .await;
        if let Err(e) = &outcome {
            self.bus.publish(
                Event::new(EventKind::ControllerFailed).with_reason(e.as_message()),
            );
        }

        token.cancel();
        ferry.close();
        spawn_rx.close();
        while let Ok(car) = spawn_rx.try_recv() {
            self.bus.publish(
                Event::new(EventKind::UnitTurnedAway)
                    .with_unit(car.id())
                    .with_reason("simulation over"),
            );
        }
        let reaped = self.wait_all_with_grace(&mut cars, generator).await;

        self.bus.publish(Event::new(EventKind::SimulationFinished));
        let _ = listener.await;

        let voyage = outcome?;
        reaped?;
        Ok(voyage)
    }

    /// Subscribes to the bus and forwards events to the subscriber set until the final event.
    ///
    /// The returned handle completes once every subscriber has processed its queue.
    fn subscriber_listener(&self) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.is_final() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        set.emit(
                            &Event::new(EventKind::SubscriberOverflow)
                                .with_reason(format!("listener lagged, {n} event(s) lost")),
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }

    /// Admits arriving cars and reaps finished ones until the controller returns.
    async fn drive(
        &self,
        ferry: &Ferry,
        controller: &mut JoinHandle<Result<Voyage, RuntimeError>>,
        spawn_rx: &mut mpsc::Receiver<Car>,
        cars: &mut JoinSet<CarOutcome>,
        token: &CancellationToken,
    ) -> Result<Voyage, RuntimeError> {
        let signal = shutdown::shutdown_requested(self.cfg.handle_signals);
        tokio::pin!(signal);
        let mut listening = true;

        loop {
            tokio::select! {
                res = &mut *controller => return flatten(res, ferry),
                Some(car) = spawn_rx.recv() => self.admit(cars, car, token),
                Some(joined) = cars.join_next() => self.reap(joined),
                res = &mut signal, if listening => {
                    listening = false;
                    match res {
                        Ok(name) => {
                            self.bus.publish(
                                Event::new(EventKind::ShutdownRequested).with_reason(name),
                            );
                            token.cancel();
                        }
                        Err(e) => eprintln!("[ferryvisor] signal handlers unavailable: {e}"),
                    }
                }
            }
        }
    }

    /// Spawns `car` into the supervised set, unless the live car limit is reached.
    fn admit(&self, cars: &mut JoinSet<CarOutcome>, car: Car, token: &CancellationToken) {
        let id = car.id();
        if let Some(limit) = self.cfg.unit_limit() {
            if cars.len() >= limit {
                self.bus.publish(
                    Event::new(EventKind::SpawnFailed)
                        .with_unit(id)
                        .with_reason(format!("car limit {limit} reached")),
                );
                return;
            }
        }

        self.bus.publish(Event::new(EventKind::UnitArrived).with_unit(id));
        let child = token.child_token();
        cars.spawn(async move {
            let res = AssertUnwindSafe(car.run(child))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(TaskError::Panicked {
                        info: panic_message(&*panic),
                    })
                });
            (id, res)
        });
    }

    /// Publishes the outcome of a finished car.
    fn reap(&self, joined: Result<CarOutcome, JoinError>) {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((id, Err(e))) if e.is_canceled() => {
                self.bus.publish(
                    Event::new(EventKind::UnitTurnedAway)
                        .with_unit(id)
                        .with_reason("simulation over"),
                );
            }
            Ok((id, Err(e))) => {
                self.bus.publish(
                    Event::new(EventKind::UnitFailed)
                        .with_unit(id)
                        .with_reason(e.as_message()),
                );
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::UnitFailed).with_reason(format!("car task lost: {e}")),
                );
            }
        }
    }

    /// Waits for all cars and the generator to finish within the configured grace period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout, aborts the remaining cars and returns
    /// [`RuntimeError::GraceExceeded`].
    async fn wait_all_with_grace(
        &self,
        cars: &mut JoinSet<CarOutcome>,
        generator: JoinHandle<u64>,
    ) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async {
            while let Some(joined) = cars.join_next().await {
                self.reap(joined);
            }
            let _ = generator.await;
        };
        let timed = time::timeout(grace, done).await;

        match timed {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = cars.len();
                cars.abort_all();
                while cars.join_next().await.is_some() {}
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_reason(format!("{stuck} car(s) aborted after {grace:?}")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

/// Unwraps the controller's result; a lost controller task is reported in the phase it died in.
fn flatten(
    res: Result<Result<Voyage, RuntimeError>, JoinError>,
    ferry: &Ferry,
) -> Result<Voyage, RuntimeError> {
    match res {
        Ok(inner) => inner,
        Err(e) => Err(RuntimeError::Controller {
            phase: ferry.phase(),
            reason: format!("controller task lost: {e}"),
        }),
    }
}
