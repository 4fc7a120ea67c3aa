//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - burst: fire rounds of concurrent callers at a coordinator
//! - config: print the effective configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use singleflight::demo::BurstPlan;

/// singleflight - coalesce concurrent calls into one in-flight execution
#[derive(Parser, Debug)]
#[command(name = "singleflight")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to a burst using config values)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run rounds of concurrent callers against a simulated slow producer
    Burst(BurstArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Overrides for the configured burst plan
#[derive(Args, Debug, Clone, Default)]
pub struct BurstArgs {
    /// Concurrent callers per round
    #[arg(short = 'n', long)]
    pub callers: Option<usize>,

    /// Simulated producer latency in milliseconds
    #[arg(short, long)]
    pub delay_ms: Option<u64>,

    /// Number of sequential rounds
    #[arg(short, long)]
    pub rounds: Option<usize>,

    /// Cache the first success and skip the producer afterwards
    #[arg(long)]
    pub once: bool,

    /// Make the simulated producer fail
    #[arg(long)]
    pub fail: bool,

    /// Label used in logs and the report
    #[arg(long)]
    pub name: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl BurstArgs {
    /// Layer command-line overrides on top of a configured plan
    pub fn apply(&self, plan: &BurstPlan) -> BurstPlan {
        BurstPlan {
            callers: self.callers.unwrap_or(plan.callers),
            delay_ms: self.delay_ms.unwrap_or(plan.delay_ms),
            rounds: self.rounds.unwrap_or(plan.rounds),
            fail: self.fail || plan.fail,
        }
    }
}
