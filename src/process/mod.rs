// src/process/mod.rs

//! Process backend.
//!
//! The supervisor never touches `tokio::process` directly; it talks to the
//! traits in [`backend`], so tests can swap in fake processes and drive the
//! state machine under paused time.
//!
//! - [`backend`] defines `ProcessLauncher`, `ChildProcess` and
//!   `ProcessTerminator`.
//! - [`command`] is the production launcher built on `tokio::process`.
//! - [`terminator`] kills stale instances by command-line pattern (`pkill -f`).
//! - [`output`] drains piped child output into debug logs.

pub mod backend;
pub mod command;
pub mod output;
pub mod terminator;

pub use backend::{BoxFuture, ChildExit, ChildProcess, ProcessLauncher, ProcessTerminator};
pub use command::{TokioChild, TokioLauncher};
pub use terminator::PkillTerminator;
