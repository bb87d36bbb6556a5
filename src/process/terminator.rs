// src/process/terminator.rs

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{Result, SupervisorError};
use crate::process::backend::{BoxFuture, ProcessTerminator};

/// Terminates stale instances with `pkill -f <pattern>`.
///
/// `pkill` exit codes: 0 = something matched, 1 = nothing matched, anything
/// else is a real failure (bad pattern, missing permissions, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct PkillTerminator;

impl ProcessTerminator for PkillTerminator {
    fn terminate_matching<'a>(&'a self, pattern: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let status = Command::new("pkill")
                .arg("-f")
                .arg(pattern)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|source| SupervisorError::Spawn {
                    program: "pkill".to_string(),
                    source,
                })?;

            match status.code() {
                Some(0) => debug!(%pattern, "terminated stale processes"),
                Some(1) => debug!(%pattern, "no stale processes matched"),
                other => {
                    return Err(SupervisorError::Other(anyhow::anyhow!(
                        "pkill -f '{pattern}' failed with status {other:?}"
                    )));
                }
            }

            Ok(())
        })
    }
}
