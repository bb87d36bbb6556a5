// src/process/output.rs

//! Draining of piped child output (`output = "log"`).

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tracing::debug;

/// Consume the child's stdout/stderr on background tasks so pipe buffers
/// never fill up. Each line becomes a `debug!` event.
pub fn drain_output(pid: Option<u32>, stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) {
    let label = pid.map_or_else(|| "?".to_string(), |p| p.to_string());

    if let Some(stdout) = stdout {
        spawn_line_drain(label.clone(), "stdout", stdout);
    }
    if let Some(stderr) = stderr {
        spawn_line_drain(label, "stderr", stderr);
    }
}

fn spawn_line_drain<R>(pid: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            debug!("child {pid} {stream}: {line}");
        }

        debug!("child {pid} {stream} closed");
    });
}
