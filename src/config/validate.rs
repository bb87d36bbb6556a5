// src/config/validate.rs

use std::time::Duration;

use regex::Regex;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigFile, LogConfig, ProcessConfig, RawConfigFile, RawLogSection, RawProcessSection,
    RawTimingSection, Timings,
};
use crate::errors::{Result, SupervisorError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SupervisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let process = validate_process(raw.process)?;
        let timing = validate_timing(&raw.timing)?;
        let log = validate_log(raw.log)?;
        Ok(ConfigFile::new_unchecked(process, timing, log))
    }
}

fn validate_process(raw: RawProcessSection) -> Result<ProcessConfig> {
    if raw.program.trim().is_empty() {
        return Err(SupervisorError::ConfigError(
            "[process].program must not be empty".to_string(),
        ));
    }

    let match_pattern = if raw.match_pattern.trim().is_empty() {
        None
    } else {
        // Best-effort syntax check; pkill's ERE dialect is close but not identical.
        Regex::new(&raw.match_pattern).map_err(|e| {
            SupervisorError::ConfigError(format!(
                "[process].match_pattern '{}' is not a valid regex: {}",
                raw.match_pattern, e
            ))
        })?;
        Some(raw.match_pattern)
    };

    Ok(ProcessConfig {
        program: raw.program,
        args: raw.args,
        match_pattern,
        working_dir: raw.working_dir,
        output: raw.output,
    })
}

fn validate_timing(raw: &RawTimingSection) -> Result<Timings> {
    let timings = Timings {
        restart_interval: duration_field("restart_interval", &raw.restart_interval)?,
        poll_interval: duration_field("poll_interval", &raw.poll_interval)?,
        start_grace: duration_field("start_grace", &raw.start_grace)?,
        stop_timeout: duration_field("stop_timeout", &raw.stop_timeout)?,
        cleanup_settle: duration_field("cleanup_settle", &raw.cleanup_settle)?,
        restart_settle: duration_field("restart_settle", &raw.restart_settle)?,
        failure_backoff: duration_field("failure_backoff", &raw.failure_backoff)?,
        status_every: duration_field("status_every", &raw.status_every)?,
    };

    for (name, value) in [
        ("restart_interval", timings.restart_interval),
        ("poll_interval", timings.poll_interval),
        ("status_every", timings.status_every),
    ] {
        if value.is_zero() {
            return Err(SupervisorError::ConfigError(format!(
                "[timing].{name} must be greater than zero"
            )));
        }
    }

    if timings.status_every.subsec_nanos() != 0 {
        return Err(SupervisorError::ConfigError(
            "[timing].status_every must be a whole number of seconds".to_string(),
        ));
    }

    Ok(timings)
}

fn duration_field(name: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| SupervisorError::ConfigError(format!("[timing].{name}: {e}")))
}

fn validate_log(raw: RawLogSection) -> Result<LogConfig> {
    if raw.file.as_os_str().is_empty() {
        return Err(SupervisorError::ConfigError(
            "[log].file must not be empty".to_string(),
        ));
    }
    Ok(LogConfig { file: raw.file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_defaults_convert_to_typed_defaults() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }

    #[test]
    fn empty_pattern_disables_cleanup() {
        let mut raw = RawConfigFile::default();
        raw.process.match_pattern = "  ".to_string();
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.process.match_pattern, None);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.process.match_pattern = "python.*(".to_string();
        match ConfigFile::try_from(raw) {
            Err(SupervisorError::ConfigError(msg)) => assert!(msg.contains("match_pattern")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.timing.poll_interval = "0s".to_string();
        match ConfigFile::try_from(raw) {
            Err(SupervisorError::ConfigError(msg)) => assert!(msg.contains("poll_interval")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn zero_grace_is_allowed() {
        let mut raw = RawConfigFile::default();
        raw.timing.start_grace = "0ms".to_string();
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert!(cfg.timing.start_grace.is_zero());
    }

    #[test]
    fn bad_duration_names_the_field() {
        let mut raw = RawConfigFile::default();
        raw.timing.stop_timeout = "ten seconds".to_string();
        match ConfigFile::try_from(raw) {
            Err(SupervisorError::ConfigError(msg)) => assert!(msg.contains("stop_timeout")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn empty_program_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.process.program = String::new();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(SupervisorError::ConfigError(_))
        ));
    }
}
