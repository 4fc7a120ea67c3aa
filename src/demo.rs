//! Burst driver for exercising a coordinator
//!
//! Fires rounds of concurrent callers at a `SingleFlight` wrapping a simulated
//! slow producer and reports how many producer calls were actually made.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};
use crate::flight::{FlightOptions, FlightStats, SingleFlight};

/// Error value produced by a failing simulated producer.
pub const SIMULATED_FAILURE: &str = "boom";

/// Shape of a burst run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstPlan {
    /// Concurrent callers per round.
    pub callers: usize,
    /// How long the simulated producer takes.
    pub delay_ms: u64,
    /// Sequential rounds; each starts after the previous one fully settled.
    pub rounds: usize,
    /// Make the simulated producer fail.
    pub fail: bool,
}

impl Default for BurstPlan {
    fn default() -> Self {
        Self {
            callers: 6,
            delay_ms: 800,
            rounds: 2,
            fail: false,
        }
    }
}

impl BurstPlan {
    pub fn validate(&self) -> Result<()> {
        if self.callers == 0 {
            return Err(FlightError::InvalidOption("callers must be at least 1".to_string()));
        }
        if self.rounds == 0 {
            return Err(FlightError::InvalidOption("rounds must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// What every caller in one round observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round: usize,
    pub successes: usize,
    pub failures: usize,
    /// Distinct success values seen in the round, sorted.
    pub values: Vec<u64>,
    pub elapsed_ms: u64,
}

impl RoundReport {
    /// True when every caller saw the same outcome.
    pub fn is_consistent(&self) -> bool {
        (self.failures == 0 && self.values.len() == 1) || (self.successes == 0 && self.values.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BurstReport {
    pub name: String,
    pub once: bool,
    pub plan: BurstPlan,
    pub rounds: Vec<RoundReport>,
    /// Times the simulated producer actually ran.
    pub producer_calls: u64,
    pub stats: FlightStats,
    pub elapsed_ms: u64,
}

impl BurstReport {
    pub fn total_calls(&self) -> usize {
        self.plan.callers * self.plan.rounds
    }

    pub fn is_consistent(&self) -> bool {
        self.rounds.iter().all(RoundReport::is_consistent)
    }
}

/// Run `plan` against a fresh coordinator built from `options`.
pub async fn run_burst(plan: &BurstPlan, options: FlightOptions) -> Result<BurstReport> {
    plan.validate()?;
    options.validate()?;

    let producer_calls = Arc::new(AtomicU64::new(0));
    let delay = Duration::from_millis(plan.delay_ms);
    let fail = plan.fail;
    let producer = {
        let producer_calls = producer_calls.clone();
        move |round: usize| {
            let producer_calls = producer_calls.clone();
            async move {
                let call = producer_calls.fetch_add(1, Ordering::SeqCst) + 1;
                log::debug!("Simulated producer call {} for round {}", call, round);
                tokio::time::sleep(delay).await;
                if fail {
                    Err(SIMULATED_FAILURE.to_string())
                } else {
                    Ok(call)
                }
            }
        }
    };

    let name = options.name.clone();
    let once = options.once;
    let flight: SingleFlight<usize, u64, String> = SingleFlight::with_options(producer, options);

    let started = Instant::now();
    let mut rounds = Vec::with_capacity(plan.rounds);
    for round in 1..=plan.rounds {
        let round_started = Instant::now();
        let results = join_all((0..plan.callers).map(|_| flight.handle(round))).await;

        let mut values: Vec<u64> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
        let successes = values.len();
        values.sort_unstable();
        values.dedup();

        let report = RoundReport {
            round,
            successes,
            failures: results.len() - successes,
            values,
            elapsed_ms: round_started.elapsed().as_millis() as u64,
        };
        log::info!(
            "Round {} settled: {} ok, {} failed in {}ms",
            round,
            report.successes,
            report.failures,
            report.elapsed_ms
        );
        rounds.push(report);
    }

    Ok(BurstReport {
        name,
        once,
        plan: plan.clone(),
        rounds,
        producer_calls: producer_calls.load(Ordering::SeqCst),
        stats: flight.stats(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_plan() -> BurstPlan {
        BurstPlan {
            callers: 5,
            delay_ms: 20,
            rounds: 3,
            fail: false,
        }
    }

    #[test]
    fn test_default_plan() {
        let plan = BurstPlan::default();
        assert_eq!(plan.callers, 6);
        assert_eq!(plan.delay_ms, 800);
        assert_eq!(plan.rounds, 2);
        assert!(!plan.fail);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_zero_callers_rejected() {
        let plan = BurstPlan {
            callers: 0,
            ..quick_plan()
        };
        assert!(matches!(plan.validate(), Err(FlightError::InvalidOption(_))));
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let plan = BurstPlan {
            rounds: 0,
            ..quick_plan()
        };
        assert!(plan.validate().is_err());
    }

    #[tokio::test]
    async fn test_one_producer_call_per_round() {
        let report = run_burst(&quick_plan(), FlightOptions::default()).await.unwrap();

        assert_eq!(report.producer_calls, 3);
        assert_eq!(report.total_calls(), 15);
        assert!(report.is_consistent());
        let values: Vec<Vec<u64>> = report.rounds.iter().map(|r| r.values.clone()).collect();
        assert_eq!(values, vec![vec![1], vec![2], vec![3]]);
        assert_eq!(report.stats.invocations, 3);
        assert_eq!(report.stats.coalesced, 12);
    }

    #[tokio::test]
    async fn test_once_runs_producer_a_single_time() {
        let report = run_burst(&quick_plan(), FlightOptions::run_once()).await.unwrap();

        assert!(report.once);
        assert_eq!(report.producer_calls, 1);
        assert!(report.rounds.iter().all(|r| r.values == vec![1]));
        assert_eq!(report.stats.fast_path_hits, 10);
    }

    #[tokio::test]
    async fn test_failing_producer_fails_every_caller() {
        let plan = BurstPlan {
            fail: true,
            ..quick_plan()
        };
        let report = run_burst(&plan, FlightOptions::default()).await.unwrap();

        assert!(report.is_consistent());
        for round in &report.rounds {
            assert_eq!(round.successes, 0);
            assert_eq!(round.failures, 5);
        }
        assert_eq!(report.stats.failures, 3);
    }

    #[tokio::test]
    async fn test_invalid_options_rejected() {
        let options = FlightOptions::default().with_event_capacity(0);
        assert!(run_burst(&quick_plan(), options).await.is_err());
    }

    #[test]
    fn test_round_consistency() {
        let mixed = RoundReport {
            round: 1,
            successes: 2,
            failures: 1,
            values: vec![1],
            elapsed_ms: 0,
        };
        assert!(!mixed.is_consistent());

        let split = RoundReport {
            round: 1,
            successes: 2,
            failures: 0,
            values: vec![1, 2],
            elapsed_ms: 0,
        };
        assert!(!split.is_consistent());
    }
}
