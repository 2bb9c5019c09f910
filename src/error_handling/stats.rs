//! Pipeline statistics tracking.
//!
//! This module provides thread-safe counters shared between the producer side
//! (enqueue/drop accounting) and the background worker (flush accounting).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;

/// Events counted by the persistent pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum PipelineCounter {
    /// Payload accepted by the bounded queue.
    Enqueued,
    /// Payload dropped because the queue was full or closed.
    Dropped,
    /// Flush attempts on a non-empty batch.
    Flushes,
    /// Rows committed to the store.
    RowsPersisted,
    /// Rows rejected inside an otherwise committed transaction.
    RowsFailed,
    /// Batches discarded because the transaction could not be opened or committed.
    BatchesDiscarded,
}

impl PipelineCounter {
    /// Short name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineCounter::Enqueued => "enqueued",
            PipelineCounter::Dropped => "dropped",
            PipelineCounter::Flushes => "flushes",
            PipelineCounter::RowsPersisted => "rows_persisted",
            PipelineCounter::RowsFailed => "rows_failed",
            PipelineCounter::BatchesDiscarded => "batches_discarded",
        }
    }
}

/// Thread-safe pipeline statistics tracker.
///
/// All counters are initialized to zero on creation and share one instance per
/// persistent sink through an `Arc`.
#[derive(Debug)]
pub struct PipelineStats {
    counters: HashMap<PipelineCounter, AtomicUsize>,
}

impl PipelineStats {
    pub fn new() -> Self {
        let mut counters = HashMap::new();
        for counter in PipelineCounter::iter() {
            counters.insert(counter, AtomicUsize::new(0));
        }
        PipelineStats { counters }
    }

    /// Adds `n` to a counter and returns the new value.
    pub fn add(&self, counter: PipelineCounter, n: usize) -> usize {
        match self.counters.get(&counter) {
            Some(c) => c.fetch_add(n, Ordering::Relaxed) + n,
            None => {
                log::error!(
                    "Attempted to increment counter {:?} which is not in the map",
                    counter
                );
                0
            }
        }
    }

    /// Increments a counter by one and returns the new value.
    pub fn increment(&self, counter: PipelineCounter) -> usize {
        self.add(counter, 1)
    }

    pub fn get(&self, counter: PipelineCounter) -> usize {
        self.counters
            .get(&counter)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Takes a point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.get(PipelineCounter::Enqueued),
            dropped: self.get(PipelineCounter::Dropped),
            flushes: self.get(PipelineCounter::Flushes),
            rows_persisted: self.get(PipelineCounter::RowsPersisted),
            rows_failed: self.get(PipelineCounter::RowsFailed),
            batches_discarded: self.get(PipelineCounter::BatchesDiscarded),
        }
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Payloads accepted by the queue.
    pub enqueued: usize,
    /// Payloads dropped on a full or closed queue.
    pub dropped: usize,
    /// Flush attempts on a non-empty batch.
    pub flushes: usize,
    /// Rows committed.
    pub rows_persisted: usize,
    /// Rows rejected inside a committed transaction.
    pub rows_failed: usize,
    /// Batches lost to a transaction failure.
    pub batches_discarded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stats_initialization() {
        let stats = PipelineStats::new();
        for counter in PipelineCounter::iter() {
            assert_eq!(stats.get(counter), 0, "{} should start at 0", counter.as_str());
        }
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_pipeline_stats_increment_returns_new_value() {
        let stats = PipelineStats::new();
        assert_eq!(stats.increment(PipelineCounter::Dropped), 1);
        assert_eq!(stats.increment(PipelineCounter::Dropped), 2);
        assert_eq!(stats.add(PipelineCounter::RowsPersisted, 10), 10);

        let snap = stats.snapshot();
        assert_eq!(snap.dropped, 2);
        assert_eq!(snap.rows_persisted, 10);
        assert_eq!(snap.enqueued, 0);
    }
}
