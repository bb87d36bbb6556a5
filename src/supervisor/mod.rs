// src/supervisor/mod.rs

//! The supervision state machine.
//!
//! - [`clock`] holds the pure restart schedule (no IO, no sleeping).
//! - [`shutdown`] is the channel signal listeners use to request shutdown.
//! - [`runner`] is the async `Supervisor` that owns the child handle and
//!   drives start / stop / restart through the process backend.

pub mod clock;
pub mod runner;
pub mod shutdown;

pub use clock::{Remaining, RestartClock, is_status_boundary};
pub use runner::{ExitReason, StartOutcome, Supervisor, WallClock, system_epoch_secs};
pub use shutdown::{Shutdown, ShutdownTrigger, shutdown_channel};
