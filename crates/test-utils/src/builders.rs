#![allow(dead_code)]

use respawn::config::{ConfigFile, RawConfigFile};
use respawn::types::ChildOutput;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults; durations use the same string syntax as
/// the TOML file and are validated by `build()`.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn command(mut self, program: &str, args: &[&str]) -> Self {
        self.config.process.program = program.to_string();
        self.config.process.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Shell snippet run via `sh -c`.
    pub fn shell(self, script: &str) -> Self {
        self.command("sh", &["-c", script])
    }

    pub fn match_pattern(mut self, pattern: &str) -> Self {
        self.config.process.match_pattern = pattern.to_string();
        self
    }

    pub fn without_cleanup(self) -> Self {
        self.match_pattern("")
    }

    pub fn output(mut self, output: ChildOutput) -> Self {
        self.config.process.output = output;
        self
    }

    pub fn restart_interval(mut self, d: &str) -> Self {
        self.config.timing.restart_interval = d.to_string();
        self
    }

    pub fn poll_interval(mut self, d: &str) -> Self {
        self.config.timing.poll_interval = d.to_string();
        self
    }

    pub fn start_grace(mut self, d: &str) -> Self {
        self.config.timing.start_grace = d.to_string();
        self
    }

    pub fn stop_timeout(mut self, d: &str) -> Self {
        self.config.timing.stop_timeout = d.to_string();
        self
    }

    /// Sets both the cleanup and the restart settle delay.
    pub fn settle(mut self, d: &str) -> Self {
        self.config.timing.cleanup_settle = d.to_string();
        self.config.timing.restart_settle = d.to_string();
        self
    }

    pub fn failure_backoff(mut self, d: &str) -> Self {
        self.config.timing.failure_backoff = d.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
