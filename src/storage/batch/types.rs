//! Batch writer data structures.

use std::fmt;

/// Why a flush ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The batch reached its configured size.
    Size,
    /// The periodic timer fired.
    Timer,
    /// The stop signal fired or every producer went away.
    Shutdown,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlushTrigger::Size => "size",
            FlushTrigger::Timer => "timer",
            FlushTrigger::Shutdown => "shutdown",
        })
    }
}

/// Summary of one flush, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushResult {
    pub trigger: FlushTrigger,
    /// Payloads in the batch when the flush started.
    pub total: usize,
    /// Rows committed.
    pub written: usize,
    /// Rows rejected individually.
    pub failed: usize,
    /// The whole batch was lost to a transaction failure.
    pub discarded: bool,
}

impl FlushResult {
    pub(crate) fn empty(trigger: FlushTrigger) -> Self {
        FlushResult {
            trigger,
            total: 0,
            written: 0,
            failed: 0,
            discarded: false,
        }
    }
}
