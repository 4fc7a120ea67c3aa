//! Coordinator state machine
//!
//! A coordinator is either `Idle` or `Running`. Every transition is a single
//! method on [`FlightState`], called with the coordinator's lock held and never
//! across an `.await`.

use std::collections::VecDeque;

use serde::Serialize;
use tokio::sync::oneshot;

/// Whether a producer invocation is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
}

/// How the most recently completed invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failure,
}

impl OutcomeKind {
    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(_) => Self::Failure,
        }
    }
}

/// A caller parked behind the in-flight invocation.
pub(crate) struct Waiter<T, E> {
    /// Arrival number, increasing across the coordinator's lifetime.
    pub ticket: u64,
    /// Single-use release handle carrying the settled outcome.
    pub release: oneshot::Sender<Result<T, E>>,
}

pub(crate) struct FlightState<T, E> {
    phase: Phase,
    cycle: u64,
    next_ticket: u64,
    initialized: bool,
    last_success: Option<T>,
    last_failure: Option<E>,
    last_outcome: Option<OutcomeKind>,
    waiters: VecDeque<Waiter<T, E>>,
}

impl<T, E> FlightState<T, E> {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            cycle: 0,
            next_ticket: 0,
            initialized: false,
            last_success: None,
            last_failure: None,
            last_outcome: None,
            waiters: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn last_outcome(&self) -> Option<OutcomeKind> {
        self.last_outcome
    }

    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }

    /// The cached success value, when `once` allows skipping the producer.
    pub fn cached(&self, once: bool) -> Option<&T> {
        if once && self.initialized {
            self.last_success.as_ref()
        } else {
            None
        }
    }

    /// Idle -> Running. Clears the previous outcome and returns the new cycle number.
    pub fn begin(&mut self) -> u64 {
        debug_assert_eq!(self.phase, Phase::Idle);
        self.phase = Phase::Running;
        self.cycle += 1;
        self.last_success = None;
        self.last_failure = None;
        self.last_outcome = None;
        self.cycle
    }

    /// Running -> Running. Queues a waiter and returns its ticket and release receiver.
    pub fn enqueue(&mut self) -> (u64, oneshot::Receiver<Result<T, E>>) {
        debug_assert_eq!(self.phase, Phase::Running);
        let (release, parked) = oneshot::channel();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.waiters.push_back(Waiter { ticket, release });
        (ticket, parked)
    }

    /// Running -> Idle after the producer settled. Returns the waiters in arrival order.
    pub fn settle(&mut self, result: &Result<T, E>) -> VecDeque<Waiter<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        match result {
            Ok(value) => {
                self.last_success = Some(value.clone());
                self.initialized = true;
            }
            Err(error) => {
                self.last_failure = Some(error.clone());
            }
        }
        self.last_outcome = Some(OutcomeKind::of(result));
        self.phase = Phase::Idle;
        std::mem::take(&mut self.waiters)
    }

    /// Running -> Idle without an outcome, when the trigger was dropped.
    pub fn abandon(&mut self) -> VecDeque<Waiter<T, E>> {
        self.phase = Phase::Idle;
        std::mem::take(&mut self.waiters)
    }

    /// The outcome slot as a result, if the last cycle settled.
    pub fn outcome(&self) -> Option<Result<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        match self.last_outcome? {
            OutcomeKind::Success => self.last_success.clone().map(Ok),
            OutcomeKind::Failure => self.last_failure.clone().map(Err),
        }
    }
}
