//! Batch writer implementation.
//!
//! This module provides the BatchWriter struct, the accumulator owned by the
//! background worker, and its methods for collecting and flushing payloads.

mod flush;

use std::sync::Arc;

use crate::error_handling::PipelineStats;
use crate::record::EncodedPayload;
use crate::storage::bulk::BulkStore;

/// Batch writer that collects payloads and loads them in bulk.
///
/// Owned exclusively by one worker task; nothing here is shared except the
/// store handle and the counters.
pub struct BatchWriter {
    store: Arc<dyn BulkStore>,
    batch_size: usize,
    correlation_id_keys: Vec<String>,
    pub(crate) buffer: Vec<EncodedPayload>,
    stats: Arc<PipelineStats>,
}

impl BatchWriter {
    pub fn new(
        store: Arc<dyn BulkStore>,
        batch_size: usize,
        correlation_id_keys: Vec<String>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let batch_size = batch_size.max(1);
        BatchWriter {
            store,
            batch_size,
            correlation_id_keys,
            buffer: Vec::with_capacity(batch_size),
            stats,
        }
    }

    /// Appends a payload. Returns true when the batch is now full.
    pub fn push(&mut self, payload: EncodedPayload) -> bool {
        self.buffer.push(payload);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.batch_size
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }
}
