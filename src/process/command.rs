// src/process/command.rs

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::config::ProcessConfig;
use crate::errors::{Result, SupervisorError};
use crate::process::backend::{BoxFuture, ChildExit, ChildProcess, ProcessLauncher};
use crate::process::output::drain_output;
use crate::types::ChildOutput;

/// Production launcher backed by `tokio::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    type Child = TokioChild;

    fn launch(&mut self, process: &ProcessConfig) -> Result<TokioChild> {
        let mut cmd = Command::new(&process.program);
        cmd.args(&process.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &process.working_dir {
            cmd.current_dir(dir);
        }

        match process.output {
            ChildOutput::Discard => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
            ChildOutput::Log => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            program: process.program.clone(),
            source,
        })?;

        debug!(
            pid = child.id(),
            cmd = %process.display_command(),
            "spawned child process"
        );

        if process.output == ChildOutput::Log {
            drain_output(child.id(), child.stdout.take(), child.stderr.take());
        }

        Ok(TokioChild { child })
    }
}

/// A child spawned by [`TokioLauncher`].
///
/// Dropping it kills the process (`kill_on_drop`), so a handle can never
/// outlive the supervisor's ownership of it.
#[derive(Debug)]
pub struct TokioChild {
    child: Child,
}

impl ChildProcess for TokioChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_wait(&mut self) -> Result<Option<ChildExit>> {
        Ok(self.child.try_wait()?.map(ChildExit::from))
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> Result<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        // Already reaped: nothing left to signal.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid).map_err(|_| {
            SupervisorError::Other(anyhow::anyhow!("pid {pid} does not fit in pid_t"))
        })?;

        kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(std::io::Error::from)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<()> {
        // No SIGTERM equivalent; fall back to a hard kill.
        self.child.start_kill()?;
        Ok(())
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ChildExit>> {
        Box::pin(async move {
            let status = self.child.wait().await?;
            Ok(ChildExit::from(status))
        })
    }

    fn kill(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.child.kill().await?;
            Ok(())
        })
    }
}
