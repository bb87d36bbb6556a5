// src/supervisor/runner.rs

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigFile, ProcessConfig, Timings};
use crate::errors::Result;
use crate::process::{ChildExit, ChildProcess, ProcessLauncher, ProcessTerminator};

use super::clock::{RestartClock, is_status_boundary};
use super::shutdown::Shutdown;

/// Result of a start (or restart) attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The child was still alive after the grace period.
    Started,
    /// Spawning failed, or the child exited within the grace period.
    Failed,
    /// Shutdown was requested part-way through. A child that was already
    /// spawned stays owned so the final `stop` reaps it.
    Interrupted,
}

/// Why [`Supervisor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A shutdown request was handled and the child stopped.
    Shutdown,
    /// The very first start failed; supervision never began.
    InitialStartFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

/// What a non-blocking look at the owned handle found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildState {
    Absent,
    Running,
    Exited(ChildExit),
}

/// Source of wall-clock time as whole seconds since the Unix epoch.
pub type WallClock = Box<dyn Fn() -> Result<u64> + Send + Sync>;

/// Reads `SystemTime::now()`.
pub fn system_epoch_secs() -> Result<u64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(anyhow::Error::from)?;
    Ok(now.as_secs())
}

/// Keeps one child process alive.
///
/// Owns at most one child handle. Everything runs on the task that calls
/// [`run`](Self::run); signal handlers only flip the [`Shutdown`] flag, so the
/// handle is never touched from two places at once.
pub struct Supervisor<L: ProcessLauncher, T: ProcessTerminator> {
    process: ProcessConfig,
    timing: Timings,
    launcher: L,
    terminator: T,
    child: Option<L::Child>,
    clock: RestartClock,
    wall_clock: WallClock,
    shutdown: Shutdown,
}

impl<L: ProcessLauncher, T: ProcessTerminator> fmt::Debug for Supervisor<L, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("process", &self.process)
            .field("timing", &self.timing)
            .field("child", &self.child.as_ref().and_then(|c| c.id()))
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<L: ProcessLauncher, T: ProcessTerminator> Supervisor<L, T> {
    pub fn new(config: &ConfigFile, launcher: L, terminator: T, shutdown: Shutdown) -> Self {
        Self {
            process: config.process.clone(),
            timing: config.timing,
            launcher,
            terminator,
            child: None,
            clock: RestartClock::new(config.timing.restart_interval),
            wall_clock: Box::new(system_epoch_secs),
            shutdown,
        }
    }

    /// Replace the wall clock used to place the periodic status line.
    pub fn with_wall_clock<F>(mut self, wall_clock: F) -> Self
    where
        F: Fn() -> Result<u64> + Send + Sync + 'static,
    {
        self.wall_clock = Box::new(wall_clock);
        self
    }

    /// Instant of the most recent successful start recorded by the loop.
    pub fn last_restart(&self) -> Option<Instant> {
        self.clock.last_restart()
    }

    /// PID of the owned child, if there is one that has not been reaped.
    pub fn child_id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    /// Main supervision loop.
    ///
    /// - Starts the child; gives up immediately if that first start fails.
    /// - Every `poll_interval`: restarts a dead child, and force-restarts a
    ///   healthy one once `restart_interval` has passed since it came up.
    /// - Unexpected errors are logged and followed by `failure_backoff`.
    /// - Returns after stopping the child once shutdown is requested.
    pub async fn run(&mut self) -> ExitReason {
        info!("=== respawn supervisor started ===");
        info!("Supervising: {}", self.process.display_command());
        info!(
            "Restart interval: {} seconds",
            self.timing.restart_interval.as_secs()
        );
        info!("Check interval: {} seconds", self.timing.poll_interval.as_secs());

        match self.start().await {
            StartOutcome::Started => self.clock.record_start(Instant::now()),
            StartOutcome::Failed => {
                error!("Failed to start child initially, exiting...");
                return ExitReason::InitialStartFailed;
            }
            StartOutcome::Interrupted => return self.shut_down().await,
        }

        while !self.shutdown.is_requested() {
            let flow = match self.tick().await {
                Ok(flow) => flow,
                Err(e) => {
                    error!("Error in main loop: {e}");
                    self.pause(self.timing.failure_backoff).await
                }
            };

            if flow == Flow::Shutdown {
                break;
            }
        }

        self.shut_down().await
    }

    /// One loop iteration: liveness check, schedule check, poll sleep, status.
    async fn tick(&mut self) -> Result<Flow> {
        let state = self.poll_child()?;
        if state != ChildState::Running {
            match state {
                ChildState::Exited(exit) => warn!("Child died ({exit})! Restarting..."),
                _ => warn!("Child is not running! Restarting..."),
            }

            match self.start().await {
                StartOutcome::Started => self.clock.record_start(Instant::now()),
                StartOutcome::Failed => {
                    warn!(
                        "Failed to restart child, will try again in {} seconds...",
                        self.timing.failure_backoff.as_secs()
                    );
                    return Ok(self.pause(self.timing.failure_backoff).await);
                }
                StartOutcome::Interrupted => return Ok(Flow::Shutdown),
            }
        }

        if self.clock.restart_due(Instant::now()) {
            info!("Scheduled restart time reached");
            match self.restart().await {
                // Measured after the restart completes, not at the tick.
                StartOutcome::Started => self.clock.record_start(Instant::now()),
                StartOutcome::Failed => warn!("Scheduled restart failed, will try again later..."),
                StartOutcome::Interrupted => return Ok(Flow::Shutdown),
            }
        }

        if self.pause(self.timing.poll_interval).await == Flow::Shutdown {
            return Ok(Flow::Shutdown);
        }

        self.report_status()?;
        Ok(Flow::Continue)
    }

    /// Start the child.
    ///
    /// Kills stale processes matching `match_pattern`, spawns, waits
    /// `start_grace` and succeeds only if the child is still alive. A handle
    /// that is still owned on entry is stopped first.
    pub async fn start(&mut self) -> StartOutcome {
        self.stop().await;

        if let Some(pattern) = self.process.match_pattern.clone() {
            if let Err(e) = self.terminator.terminate_matching(&pattern).await {
                warn!("Could not clean up processes matching '{pattern}': {e}");
            }
            if self.pause(self.timing.cleanup_settle).await == Flow::Shutdown {
                return StartOutcome::Interrupted;
            }
        }

        info!("Starting {}...", self.process.display_command());

        let child = match self.launcher.launch(&self.process) {
            Ok(child) => child,
            Err(e) => {
                error!("Error starting child: {e}");
                return StartOutcome::Failed;
            }
        };
        let pid = pid_label(child.id());
        self.child = Some(child);

        if self.pause(self.timing.start_grace).await == Flow::Shutdown {
            return StartOutcome::Interrupted;
        }

        match self.poll_child() {
            Ok(ChildState::Running) => {
                info!("Child started successfully with PID {pid}");
                StartOutcome::Started
            }
            Ok(state) => {
                match state {
                    ChildState::Exited(exit) => error!("Child failed to start! ({exit})"),
                    _ => error!("Child failed to start!"),
                }
                self.child = None;
                StartOutcome::Failed
            }
            Err(e) => {
                error!("Could not confirm that child {pid} started: {e}");
                self.stop().await;
                StartOutcome::Failed
            }
        }
    }

    /// Stop the owned child, if any.
    ///
    /// SIGTERM, then up to `stop_timeout` for it to exit, then SIGKILL and an
    /// unbounded wait for the reap. The handle is always cleared.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        match child.try_wait() {
            Ok(Some(exit)) => {
                debug!("child already exited ({exit}); nothing to stop");
                return;
            }
            Ok(None) => {}
            Err(e) => warn!("Could not query child status before stopping: {e}"),
        }

        let pid = pid_label(child.id());
        info!("Stopping child process {pid}");

        if let Err(e) = child.terminate() {
            warn!("Failed to send termination request to {pid}: {e}");
        }

        let waited = timeout(self.timing.stop_timeout, child.wait()).await;
        match waited {
            Ok(Ok(exit)) => debug!("child {pid} exited after termination request ({exit})"),
            Ok(Err(e)) => {
                warn!("Waiting for child {pid} failed ({e}), force killing...");
                force_kill(&mut child, &pid).await;
            }
            Err(_) => {
                warn!("Child didn't shut down gracefully, force killing...");
                force_kill(&mut child, &pid).await;
            }
        }

        info!("Child stopped");
    }

    /// Whether the owned child is alive. Never blocks.
    pub fn is_running(&mut self) -> bool {
        match self.poll_child() {
            Ok(state) => state == ChildState::Running,
            Err(e) => {
                warn!("Could not query child status: {e}");
                false
            }
        }
    }

    /// Stop, settle, start.
    pub async fn restart(&mut self) -> StartOutcome {
        info!("=== RESTARTING CHILD ===");
        self.stop().await;

        if self.pause(self.timing.restart_settle).await == Flow::Shutdown {
            return StartOutcome::Interrupted;
        }

        self.start().await
    }

    fn poll_child(&mut self) -> Result<ChildState> {
        let Some(child) = self.child.as_mut() else {
            return Ok(ChildState::Absent);
        };

        Ok(match child.try_wait()? {
            None => ChildState::Running,
            Some(exit) => ChildState::Exited(exit),
        })
    }

    async fn shut_down(&mut self) -> ExitReason {
        info!("Supervisor shutting down...");
        self.stop().await;
        ExitReason::Shutdown
    }

    /// Sleep for `duration` unless shutdown is requested first.
    async fn pause(&mut self, duration: Duration) -> Flow {
        if self.shutdown.is_requested() {
            return Flow::Shutdown;
        }

        tokio::select! {
            _ = sleep(duration) => Flow::Continue,
            _ = self.shutdown.requested() => Flow::Shutdown,
        }
    }

    fn report_status(&self) -> Result<()> {
        let epoch_secs = (self.wall_clock)()?;

        if is_status_boundary(epoch_secs, self.timing.status_every) {
            let remaining = self.clock.remaining(Instant::now());
            info!("Child status: OK. Next restart in {remaining}");
        }

        Ok(())
    }
}

async fn force_kill<C: ChildProcess>(child: &mut C, pid: &str) {
    if let Err(e) = child.kill().await {
        error!("Failed to kill child {pid}: {e}");
    }
}

fn pid_label(pid: Option<u32>) -> String {
    pid.map_or_else(|| "?".to_string(), |p| p.to_string())
}
