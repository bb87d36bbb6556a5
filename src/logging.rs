// src/logging.rs

//! Logging setup for `respawn` using `tracing` + `tracing-subscriber`.
//!
//! Every event is rendered as a single `[YYYY-MM-DD HH:MM:SS] <message>` line
//! (local time) and written twice: once to stdout and once appended to the
//! event log file from `[log].file`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `RESPAWN_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::cli::LogLevel;

/// `strftime` pattern for the bracketed timestamp prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Event formatter producing `[timestamp] message` lines.
///
/// No level, target or span context is printed. Structured fields, if an
/// event carries any, follow the message as `key=value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLineFormat;

impl<S, N> FormatEvent<S, N> for EventLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "[{}] ", Local::now().format(TIMESTAMP_FORMAT))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialise the global logging subscriber.
///
/// Opens (or creates) `log_file` in append mode before installing anything,
/// so an unwritable path is reported as an error instead of losing events.
pub fn init_logging(cli_level: Option<LogLevel>, log_file: &Path) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var("RESPAWN_LOG").ok().as_deref());
    let file = open_event_log(log_file)?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(EventLineFormat)
        .with_ansi(false)
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(EventLineFormat)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    let filter = LevelFilter::from_level(level);

    tracing_subscriber::registry()
        .with(stdout_layer.with_filter(filter))
        .with(file_layer.with_filter(filter))
        .try_init()
        .context("installing global tracing subscriber")?;

    Ok(())
}

/// Open the event log for appending, creating parent directories as needed.
pub fn open_event_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {:?}", parent))?;
        }
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening event log {:?}", path))
}

fn resolve_level(cli_level: Option<LogLevel>, env_level: Option<&str>) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => env_level
            .and_then(parse_level_str)
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use regex::Regex;
    use tracing::info;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(EventLineFormat)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn lines_are_timestamp_then_message() {
        let out = capture(|| info!("Child started successfully with PID 42"));
        let re = Regex::new(
            r"^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\] Child started successfully with PID 42\n$",
        )
        .unwrap();
        assert!(re.is_match(&out), "unexpected line: {out:?}");
    }

    #[test]
    fn level_is_not_printed() {
        let out = capture(|| tracing::warn!("Child died! Restarting..."));
        assert!(!out.contains("WARN"), "unexpected line: {out:?}");
        assert!(out.ends_with("] Child died! Restarting...\n"));
    }

    #[test]
    fn cli_level_wins_over_env() {
        assert_eq!(
            resolve_level(Some(LogLevel::Warn), Some("trace")),
            tracing::Level::WARN
        );
        assert_eq!(resolve_level(None, Some(" Debug ")), tracing::Level::DEBUG);
        assert_eq!(resolve_level(None, Some("loud")), tracing::Level::INFO);
        assert_eq!(resolve_level(None, None), tracing::Level::INFO);
    }

    #[test]
    fn event_log_is_opened_in_append_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("supervisor.log");

        {
            let mut f = open_event_log(&path).unwrap();
            writeln!(f, "first").unwrap();
        }
        {
            let mut f = open_event_log(&path).unwrap();
            writeln!(f, "second").unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
