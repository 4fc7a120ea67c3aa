use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

use singleflight::demo::{BurstReport, run_burst};

mod cli;
mod config;

use cli::Cli;
use cli::commands::{BurstArgs, Commands};
use config::Config;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("singleflight")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("singleflight.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_burst_command(&BurstArgs::default(), config).await,
        Some(Commands::Burst(args)) => handle_burst_command(args, config).await,
        Some(Commands::Config) => handle_config_command(config),
    }
}

async fn handle_burst_command(args: &BurstArgs, config: &Config) -> Result<()> {
    let plan = args.apply(&config.burst);
    let mut options = config.flight.clone().with_once(args.once || config.flight.once);
    if let Some(name) = &args.name {
        options = options.with_name(name.clone());
    }
    info!("Running burst {:?} with options {:?}", plan, options);

    if !args.json {
        println!(
            "{} {} rounds x {} callers, producer delay {}ms{}",
            "Burst:".cyan(),
            plan.rounds,
            plan.callers,
            plan.delay_ms,
            if options.once { " (once)" } else { "" }
        );
    }

    let report = run_burst(&plan, options).await.context("Burst failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &BurstReport) {
    for round in &report.rounds {
        let outcome = if round.failures == 0 {
            format!("ok {:?}", round.values).green()
        } else if round.successes == 0 {
            format!("failed x{}", round.failures).red()
        } else {
            format!("mixed: {} ok, {} failed", round.successes, round.failures).yellow()
        };
        println!("  round {:>3}: {} in {}ms", round.round, outcome, round.elapsed_ms);
    }

    let saved = (report.total_calls() as u64).saturating_sub(report.producer_calls);
    println!(
        "{} {} calls, {} producer runs, {} coalesced, {} cached, {} saved in {}ms",
        "Done:".green(),
        report.total_calls(),
        report.producer_calls,
        report.stats.coalesced,
        report.stats.fast_path_hits,
        saved,
        report.elapsed_ms
    );
    if !report.is_consistent() {
        println!("{}", "Warning: callers in one round saw different outcomes".red());
    }
}

fn handle_config_command(config: &Config) -> Result<()> {
    info!("Printing effective config");
    print!("{}", config.to_yaml()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the configured level is known
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
