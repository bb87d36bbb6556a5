// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod process;
pub mod signals;
pub mod supervisor;
pub mod types;

use anyhow::Result;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::config::duration::format_duration;
use crate::process::{PkillTerminator, TokioLauncher};
use crate::signals::spawn_signal_listener;
use crate::supervisor::{ExitReason, Supervisor, shutdown_channel};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - logging (stdout + event log file)
/// - SIGINT / SIGTERM handling
/// - the supervisor with the real process backend
///
/// Returns `None` for `--dry-run`, otherwise why supervision ended.
pub async fn run(args: CliArgs) -> Result<Option<ExitReason>> {
    let cfg = load_or_default(args.config.as_deref())?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(None);
    }

    logging::init_logging(args.log_level, &cfg.log.file)?;

    let (trigger, shutdown) = shutdown_channel();
    let _signal_task = spawn_signal_listener(trigger)?;

    let mut supervisor = Supervisor::new(&cfg, TokioLauncher, PkillTerminator, shutdown);
    debug!(?supervisor, "supervisor constructed");

    Ok(Some(supervisor.run().await))
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("respawn dry-run");
    println!();

    println!("process:");
    println!("  command: {}", cfg.process.display_command());
    match cfg.process.match_pattern {
        Some(ref pattern) => println!("  match_pattern: {pattern}"),
        None => println!("  match_pattern: (cleanup disabled)"),
    }
    if let Some(ref dir) = cfg.process.working_dir {
        println!("  working_dir: {}", dir.display());
    }
    println!("  output: {:?}", cfg.process.output);
    println!();

    let t = &cfg.timing;
    println!("timing:");
    for (name, value) in [
        ("restart_interval", t.restart_interval),
        ("poll_interval", t.poll_interval),
        ("start_grace", t.start_grace),
        ("stop_timeout", t.stop_timeout),
        ("cleanup_settle", t.cleanup_settle),
        ("restart_settle", t.restart_settle),
        ("failure_backoff", t.failure_backoff),
        ("status_every", t.status_every),
    ] {
        println!("  {name}: {}", format_duration(value));
    }
    println!();

    println!("log:");
    println!("  file: {}", cfg.log.file.display());
}
