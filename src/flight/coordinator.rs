//! The single-flight coordinator
//!
//! `SingleFlight` wraps a [`Producer`] so that concurrent calls to
//! [`SingleFlight::handle`] share one producer invocation:
//!
//! - Idle: the caller becomes the trigger and runs the producer.
//! - Running: the caller is queued and receives the trigger's outcome.
//! - `once` + succeeded before: the caller gets the cached value immediately.
//!
//! Only the trigger's argument reaches the producer. Arguments passed by queued
//! callers are dropped unused.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, oneshot};

use super::events::FlightEvent;
use super::options::FlightOptions;
use super::producer::Producer;
use super::state::{FlightState, OutcomeKind, Phase};
use super::stats::{FlightStats, StatsCounters};

/// Coalesces concurrent calls to an async producer into one in-flight execution.
pub struct SingleFlight<A, T, E>
where
    A: Send + 'static,
{
    producer: Box<dyn Producer<A, T, E>>,
    options: FlightOptions,
    state: Mutex<FlightState<T, E>>,
    stats: StatsCounters,
    events: broadcast::Sender<FlightEvent>,
}

/// What a caller does after inspecting the state.
enum Entry<T, E> {
    Cached(T),
    Lead(u64),
    Wait {
        cycle: u64,
        ticket: u64,
        parked: oneshot::Receiver<Result<T, E>>,
    },
}

impl<A, T, E> SingleFlight<A, T, E>
where
    A: Send + 'static,
{
    /// Wrap `producer` with the given options.
    pub fn with_options<P>(producer: P, options: FlightOptions) -> Self
    where
        P: Producer<A, T, E> + 'static,
    {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            producer: Box::new(producer),
            options,
            state: Mutex::new(FlightState::new()),
            stats: StatsCounters::default(),
            events,
        }
    }

    /// Wrap `producer`; every idle call runs it again.
    pub fn new<P>(producer: P) -> Self
    where
        P: Producer<A, T, E> + 'static,
    {
        Self::with_options(producer, FlightOptions::default())
    }

    /// Wrap `producer`; after its first success the value is served forever.
    pub fn once<P>(producer: P) -> Self
    where
        P: Producer<A, T, E> + 'static,
    {
        Self::with_options(producer, FlightOptions::run_once())
    }

    pub fn options(&self) -> &FlightOptions {
        &self.options
    }

    /// True while a producer invocation is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.lock().phase() == Phase::Running
    }

    /// True once the producer has succeeded at least once.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_initialized()
    }

    /// Number of callers queued behind the current invocation.
    pub fn waiting(&self) -> usize {
        self.lock().waiting()
    }

    /// How the most recent invocation ended; `None` while running or before the first.
    pub fn last_outcome(&self) -> Option<OutcomeKind> {
        self.lock().last_outcome()
    }

    /// Number of producer invocations started so far.
    pub fn cycles(&self) -> u64 {
        self.lock().cycle()
    }

    pub fn stats(&self) -> FlightStats {
        self.stats.snapshot()
    }

    /// Receive lifecycle events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FlightEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, FlightState<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FlightEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn abandon(&self, cycle: u64) {
        let mut state = self.lock();
        let waiters = state.abandon();
        self.stats.record_abandoned();
        tracing::warn!(
            flight = %self.options.name,
            cycle,
            waiters = waiters.len(),
            "Trigger dropped before producer settled, releasing waiters to retry"
        );
        self.emit(FlightEvent::Abandoned {
            cycle,
            waiters: waiters.len(),
        });
        // Dropping the release handles wakes every parked caller with a closed channel.
        drop(waiters);
    }
}

impl<A, T, E> SingleFlight<A, T, E>
where
    A: Send + 'static,
    T: Clone,
    E: Clone,
{
    /// Run the producer, or join the invocation already in flight.
    ///
    /// Every caller coalesced into one invocation gets a clone of the same
    /// success value or the same error. `arg` is used only if this call
    /// triggers the invocation.
    pub async fn handle(&self, arg: A) -> Result<T, E> {
        loop {
            match self.enter() {
                Entry::Cached(value) => return Ok(value),
                Entry::Lead(cycle) => return self.lead(cycle, arg).await,
                Entry::Wait { cycle, ticket, parked } => match parked.await {
                    Ok(outcome) => return outcome,
                    Err(_) => {
                        tracing::debug!(
                            flight = %self.options.name,
                            cycle,
                            ticket,
                            "Trigger abandoned, re-entering"
                        );
                    }
                },
            }
        }
    }

    /// The settled outcome of the most recent invocation, if any.
    pub fn last_result(&self) -> Option<Result<T, E>> {
        self.lock().outcome()
    }

    fn enter(&self) -> Entry<T, E> {
        let mut state = self.lock();

        if let Some(value) = state.cached(self.options.once) {
            let value = value.clone();
            self.stats.record_fast_path();
            self.emit(FlightEvent::FastPath);
            return Entry::Cached(value);
        }

        match state.phase() {
            Phase::Idle => {
                let cycle = state.begin();
                self.stats.record_invocation();
                tracing::debug!(flight = %self.options.name, cycle, "Starting producer");
                self.emit(FlightEvent::Started { cycle });
                Entry::Lead(cycle)
            }
            Phase::Running => {
                let cycle = state.cycle();
                let (ticket, parked) = state.enqueue();
                self.stats.record_coalesced();
                tracing::debug!(
                    flight = %self.options.name,
                    cycle,
                    ticket,
                    waiting = state.waiting(),
                    "Joining in-flight producer"
                );
                self.emit(FlightEvent::Queued { cycle, ticket });
                Entry::Wait { cycle, ticket, parked }
            }
        }
    }

    async fn lead(&self, cycle: u64, arg: A) -> Result<T, E> {
        let mut guard = AbandonGuard {
            flight: self,
            cycle,
            armed: true,
        };
        let result = self.producer.produce(arg).await;
        guard.armed = false;
        self.settle(cycle, &result);
        result
    }

    fn settle(&self, cycle: u64, result: &Result<T, E>) {
        let outcome = OutcomeKind::of(result);
        if outcome == OutcomeKind::Failure {
            self.stats.record_failure();
        }

        // Released under the lock so a following cycle's events never precede these.
        let mut state = self.lock();
        let waiters = state.settle(result);
        tracing::debug!(
            flight = %self.options.name,
            cycle,
            ?outcome,
            waiters = waiters.len(),
            "Producer settled"
        );
        self.emit(FlightEvent::Settled {
            cycle,
            outcome,
            waiters: waiters.len(),
        });

        for (position, waiter) in waiters.into_iter().enumerate() {
            // A closed channel means that caller was dropped while parked.
            let _ = waiter.release.send(result.clone());
            self.emit(FlightEvent::Released {
                cycle,
                ticket: waiter.ticket,
                position,
            });
        }
    }
}

impl<A, T, E> fmt::Debug for SingleFlight<A, T, E>
where
    A: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SingleFlight")
            .field("name", &self.options.name)
            .field("once", &self.options.once)
            .field("phase", &state.phase())
            .field("cycle", &state.cycle())
            .field("waiting", &state.waiting())
            .finish()
    }
}

/// Returns the coordinator to Idle if the trigger's future is dropped mid-flight.
struct AbandonGuard<'a, A, T, E>
where
    A: Send + 'static,
{
    flight: &'a SingleFlight<A, T, E>,
    cycle: u64,
    armed: bool,
}

impl<A, T, E> Drop for AbandonGuard<'_, A, T, E>
where
    A: Send + 'static,
{
    fn drop(&mut self) {
        if self.armed {
            self.flight.abandon(self.cycle);
        }
    }
}
