//! Infrastructure layer module
//!
//! Configuration loading and logging initialization for the binary.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConfigLoader};
