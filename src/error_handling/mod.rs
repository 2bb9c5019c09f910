//! Error handling and pipeline statistics.
//!
//! This module provides:
//! - The error taxonomy (initialization, encoding, database, sink)
//! - Atomic counters for queue and flush accounting
//!
//! Only initialization errors halt a caller. Database errors are logged by the
//! background worker and counted, never propagated to producers.

mod stats;
mod types;

// Re-export public API
pub use stats::{PipelineCounter, PipelineStats, StatsSnapshot};
pub use types::{DatabaseError, EncodeError, InitializationError, SinkError};
