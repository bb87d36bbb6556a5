// src/signals.rs

//! OS signal handling.
//!
//! SIGINT and SIGTERM both request a graceful shutdown. The listener never
//! touches the child itself: it only flips the [`ShutdownTrigger`], and the
//! supervisor loop does the stopping.
//!
//! On non-unix platforms only Ctrl-C is observed.

use std::fmt;
use std::io;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::supervisor::ShutdownTrigger;

/// The termination signals we react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Registered signal streams.
///
/// Registration happens in [`SignalListener::install`], so signals delivered
/// after it returns are queued rather than killing the process.
#[cfg(unix)]
pub struct SignalListener {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the next signal. `None` once both streams are closed.
    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        tokio::select! {
            Some(()) = self.sigint.recv() => Some(ShutdownSignal::Interrupt),
            Some(()) = self.sigterm.recv() => Some(ShutdownSignal::Terminate),
            else => None,
        }
    }
}

#[cfg(not(unix))]
pub struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    pub fn install() -> io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        tokio::signal::ctrl_c().await.ok()?;
        Some(ShutdownSignal::Interrupt)
    }
}

/// Install signal handlers and forward the first signal to `trigger`.
///
/// Later signals are logged and otherwise ignored: the supervisor is already
/// stopping the child.
pub fn spawn_signal_listener(trigger: ShutdownTrigger) -> io::Result<JoinHandle<()>> {
    let mut listener = SignalListener::install()?;

    Ok(tokio::spawn(async move {
        let mut requested = false;

        while let Some(signal) = listener.recv().await {
            if requested {
                info!("Received signal {signal} while already shutting down");
                continue;
            }
            info!("Received signal {signal}, shutting down...");
            trigger.request();
            requested = true;
        }

        if !requested {
            error!("signal streams closed; shutdown signals will no longer be observed");
        }
    }))
}
