//! Application configuration and constants.
//!
//! This module provides:
//! - Default values and fixed schema/payload names
//! - Sink, logger and HTTP instrumentation settings
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{parse_duration, Cli, Command, HttpLogConfig, LogFormat, LoggerConfig, SinkConfig};
