// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::ChildOutput;

/// Top-level configuration exactly as read from a TOML file.
///
/// ```toml
/// [process]
/// program = "python3"
/// args = ["-m", "AnonXMusic"]
/// match_pattern = "python.*AnonXMusic"
///
/// [timing]
/// restart_interval = "6h"
/// poll_interval = "30s"
///
/// [log]
/// file = "supervisor.log"
/// ```
///
/// All sections are optional. Durations stay as strings here; they are parsed
/// when converting into a [`ConfigFile`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub process: RawProcessSection,

    #[serde(default)]
    pub timing: RawTimingSection,

    #[serde(default)]
    pub log: RawLogSection,
}

/// `[process]` section: what to launch and how to find stale copies of it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProcessSection {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Command-line pattern used to kill leftover instances before each start.
    ///
    /// An empty string disables the cleanup step.
    #[serde(default = "default_match_pattern")]
    pub match_pattern: String,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default)]
    pub output: ChildOutput,
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-m".to_string(), "AnonXMusic".to_string()]
}

fn default_match_pattern() -> String {
    "python.*AnonXMusic".to_string()
}

impl Default for RawProcessSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            match_pattern: default_match_pattern(),
            working_dir: None,
            output: ChildOutput::default(),
        }
    }
}

/// `[timing]` section. Every value is a duration string such as `"30s"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTimingSection {
    #[serde(default = "default_restart_interval")]
    pub restart_interval: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    #[serde(default = "default_start_grace")]
    pub start_grace: String,
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout: String,
    #[serde(default = "default_settle")]
    pub cleanup_settle: String,
    #[serde(default = "default_settle")]
    pub restart_settle: String,
    #[serde(default = "default_failure_backoff")]
    pub failure_backoff: String,
    #[serde(default = "default_status_every")]
    pub status_every: String,
}

fn default_restart_interval() -> String {
    "6h".to_string()
}

fn default_poll_interval() -> String {
    "30s".to_string()
}

fn default_start_grace() -> String {
    "5s".to_string()
}

fn default_stop_timeout() -> String {
    "10s".to_string()
}

fn default_settle() -> String {
    "2s".to_string()
}

fn default_failure_backoff() -> String {
    "60s".to_string()
}

fn default_status_every() -> String {
    "5m".to_string()
}

impl Default for RawTimingSection {
    fn default() -> Self {
        Self {
            restart_interval: default_restart_interval(),
            poll_interval: default_poll_interval(),
            start_grace: default_start_grace(),
            stop_timeout: default_stop_timeout(),
            cleanup_settle: default_settle(),
            restart_settle: default_settle(),
            failure_backoff: default_failure_backoff(),
            status_every: default_status_every(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawLogSection {
    /// Append-only event log; every line also goes to stdout.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("supervisor.log")
}

impl Default for RawLogSection {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`, which parses
/// durations and checks invariants (see `validate.rs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub process: ProcessConfig,
    pub timing: Timings,
    pub log: LogConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(process: ProcessConfig, timing: Timings, log: LogConfig) -> Self {
        Self {
            process,
            timing,
            log,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            process: ProcessConfig::default(),
            timing: Timings::default(),
            log: LogConfig::default(),
        }
    }
}

/// The supervised command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    pub program: String,
    pub args: Vec<String>,
    /// `None` when stale-process cleanup is disabled.
    pub match_pattern: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub output: ChildOutput,
}

impl ProcessConfig {
    /// Human-readable command line, for log lines.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            match_pattern: Some(default_match_pattern()),
            working_dir: None,
            output: ChildOutput::default(),
        }
    }
}

/// Every delay and interval the supervisor uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Scheduled force-restart period.
    pub restart_interval: Duration,
    /// Liveness-check cadence.
    pub poll_interval: Duration,
    /// Delay between spawn and the single liveness sample in `start`.
    pub start_grace: Duration,
    /// How long `stop` waits after SIGTERM before escalating to SIGKILL.
    pub stop_timeout: Duration,
    /// Pause after killing stale matching processes.
    pub cleanup_settle: Duration,
    /// Pause between `stop` and `start` during a restart.
    pub restart_settle: Duration,
    /// Sleep after a failed restart or an unexpected loop error.
    pub failure_backoff: Duration,
    /// Wall-clock boundary on which the status line is printed.
    pub status_every: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            restart_interval: Duration::from_secs(6 * 60 * 60),
            poll_interval: Duration::from_secs(30),
            start_grace: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(10),
            cleanup_settle: Duration::from_secs(2),
            restart_settle: Duration::from_secs(2),
            failure_backoff: Duration::from_secs(60),
            status_every: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}
