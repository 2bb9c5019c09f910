//! Process-level initialization.
//!
//! This module provides the diagnostics logger setup used by binaries that
//! embed the pipeline. Database pools are set up through
//! [`crate::storage::init_pg_pool`].

mod logger;

// Re-export public API
pub use logger::init_logger_with;
