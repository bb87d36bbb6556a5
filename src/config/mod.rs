// src/config/mod.rs

//! Configuration loading and validation for respawn.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Parse duration strings such as `"6h"` or `"30s"` (`duration.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and convert the raw model into typed settings (`validate.rs`).
//!
//! Every section and key is optional; an absent file yields the built-in
//! defaults (6h scheduled restarts, 30s polling, `python3 -m AnonXMusic`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, LogConfig, ProcessConfig, RawConfigFile, RawLogSection, RawProcessSection,
    RawTimingSection, Timings,
};
