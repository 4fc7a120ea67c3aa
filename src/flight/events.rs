//! Lifecycle events broadcast by a coordinator
//!
//! Subscribers observe the state machine without touching it. Release events
//! carry the waiter's arrival ticket, which makes FIFO release checkable
//! without relying on task wake-up timing.

use serde::Serialize;

use super::state::OutcomeKind;

/// A transition or notable step inside a coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlightEvent {
    /// Idle -> Running: the producer was invoked.
    Started { cycle: u64 },
    /// A caller arrived while Running and was queued.
    Queued { cycle: u64, ticket: u64 },
    /// The producer settled; the coordinator is Idle again.
    Settled {
        cycle: u64,
        outcome: OutcomeKind,
        waiters: usize,
    },
    /// A queued caller was handed the settled outcome.
    Released { cycle: u64, ticket: u64, position: usize },
    /// A `once` coordinator answered from its cached value.
    FastPath,
    /// The triggering caller was dropped before the producer settled.
    Abandoned { cycle: u64, waiters: usize },
}

impl FlightEvent {
    /// Cycle this event belongs to, if any.
    pub fn cycle(&self) -> Option<u64> {
        match self {
            Self::Started { cycle }
            | Self::Queued { cycle, .. }
            | Self::Settled { cycle, .. }
            | Self::Released { cycle, .. }
            | Self::Abandoned { cycle, .. } => Some(*cycle),
            Self::FastPath => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_accessor() {
        assert_eq!(FlightEvent::Started { cycle: 3 }.cycle(), Some(3));
        assert_eq!(
            FlightEvent::Released {
                cycle: 2,
                ticket: 7,
                position: 0
            }
            .cycle(),
            Some(2)
        );
        assert_eq!(FlightEvent::FastPath.cycle(), None);
    }

    #[test]
    fn test_event_serialization() {
        let event = FlightEvent::Settled {
            cycle: 1,
            outcome: OutcomeKind::Failure,
            waiters: 4,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"settled\""));
        assert!(json.contains("\"outcome\":\"failure\""));
        assert!(json.contains("\"waiters\":4"));
    }
}
