// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `respawn`.
///
/// Every flag is optional; running without any reproduces the built-in
/// behaviour (`python3 -m AnonXMusic`, restarted every 6 hours).
#[derive(Debug, Clone, Parser)]
#[command(
    name = "respawn",
    version,
    about = "Keep one long-running process alive and restart it on a fixed schedule.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a TOML config file.
    ///
    /// When omitted, built-in defaults are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RESPAWN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate the config, print it, but don't launch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
