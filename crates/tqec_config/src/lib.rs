//! Parsing and validation of `tqec.toml` optimizer configuration files.
//!
//! This crate reads the optimizer configuration and produces a strongly-typed
//! [`OptimizerConfig`] holding the annealing schedule, the router's margin and
//! congestion penalties, the RNG seed, and the list of optimization phases.
//! Every key is optional; a missing file section falls back to the defaults.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_config};
pub use types::*;
