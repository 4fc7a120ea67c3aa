//! Counters describing how much work a coordinator saved

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time copy of a coordinator's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlightStats {
    /// Producer invocations started.
    pub invocations: u64,
    /// Calls that waited on another caller's invocation.
    pub coalesced: u64,
    /// Calls answered from the `once` cache.
    pub fast_path_hits: u64,
    /// Producer invocations that failed.
    pub failures: u64,
    /// Invocations whose triggering caller was dropped mid-flight.
    pub abandoned: u64,
}

impl FlightStats {
    /// Total calls made to `handle`, counting a re-queued waiter once per queueing.
    pub fn calls(&self) -> u64 {
        self.invocations + self.coalesced + self.fast_path_hits
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    invocations: AtomicU64,
    coalesced: AtomicU64,
    fast_path_hits: AtomicU64,
    failures: AtomicU64,
    abandoned: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fast_path(&self) {
        self.fast_path_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> FlightStats {
        FlightStats {
            invocations: self.invocations.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            fast_path_hits: self.fast_path_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counters_are_zero() {
        let counters = StatsCounters::default();
        assert_eq!(counters.snapshot(), FlightStats::default());
    }

    #[test]
    fn test_snapshot_reflects_records() {
        let counters = StatsCounters::default();
        counters.record_invocation();
        counters.record_coalesced();
        counters.record_coalesced();
        counters.record_fast_path();
        counters.record_failure();
        counters.record_abandoned();

        let stats = counters.snapshot();
        assert_eq!(stats.invocations, 1);
        assert_eq!(stats.coalesced, 2);
        assert_eq!(stats.fast_path_hits, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.abandoned, 1);
        assert_eq!(stats.calls(), 4);
    }
}
