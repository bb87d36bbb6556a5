// src/process/backend.rs

//! Pluggable process backend abstraction.
//!
//! - `ProcessLauncher` spawns the supervised program and hands back a
//!   `ChildProcess` handle.
//! - `ChildProcess` is everything the supervisor may do with a running child:
//!   poll it, ask it to terminate, wait for it, kill it.
//! - `ProcessTerminator` kills processes the supervisor does *not* own, by
//!   command-line pattern (leftovers from a crashed supervisor, duplicates
//!   started by hand, ...).
//!
//! Async methods return boxed futures so the traits stay object-safe and
//! usable from `tokio::select!`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::config::ProcessConfig;
use crate::errors::Result;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ChildExit {
    pub fn code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn signaled() -> Self {
        Self { code: None }
    }
}

impl From<std::process::ExitStatus> for ChildExit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Spawns the supervised program.
pub trait ProcessLauncher: Send {
    type Child: ChildProcess;

    /// Start `process` and return its handle.
    ///
    /// Output must not be inherited from the supervisor's terminal.
    fn launch(&mut self, process: &ProcessConfig) -> Result<Self::Child>;
}

/// A handle to one running (or exited) child.
pub trait ChildProcess: Send {
    /// OS process id, if the process has not been reaped yet.
    fn id(&self) -> Option<u32>;

    /// Non-blocking exit check: `Ok(None)` while the process is still alive.
    fn try_wait(&mut self) -> Result<Option<ChildExit>>;

    /// Ask the process to exit (SIGTERM on unix). Does not wait.
    fn terminate(&mut self) -> Result<()>;

    /// Wait until the process exits.
    fn wait(&mut self) -> BoxFuture<'_, Result<ChildExit>>;

    /// Forcefully kill the process (SIGKILL on unix) and reap it.
    fn kill(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Best-effort termination of processes matched by command line.
pub trait ProcessTerminator: Send + Sync {
    /// Terminate every process whose full command line matches `pattern`.
    ///
    /// Finding nothing to terminate is not an error.
    fn terminate_matching<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, Result<()>>;
}
