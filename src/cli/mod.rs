//! CLI module for singleflight - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running coordinator
//! bursts and inspecting configuration.

pub mod commands;

pub use commands::Cli;
