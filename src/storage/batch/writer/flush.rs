//! Batch flushing logic: one bulk-load transaction per batch.

use crate::error_handling::PipelineCounter;
use crate::storage::batch::correlation::correlate;
use crate::storage::batch::types::{FlushResult, FlushTrigger};
use crate::storage::bulk::LogRow;

use super::BatchWriter;

impl BatchWriter {
    /// Flushes all buffered payloads to the store.
    ///
    /// One transaction per batch. Rows the store rejects are logged and
    /// skipped and the transaction is still committed. If the transaction
    /// cannot be opened or committed the whole batch is dropped. In every
    /// case the buffer is empty afterwards; nothing is retried.
    pub async fn flush(&mut self, trigger: FlushTrigger) -> FlushResult {
        if self.buffer.is_empty() {
            return FlushResult::empty(trigger);
        }

        self.stats.increment(PipelineCounter::Flushes);
        log::debug!(
            "Flushing batch of {} payloads ({} trigger)",
            self.buffer.len(),
            trigger
        );

        let result = self.load_batch(trigger).await;
        self.buffer.clear();

        self.stats.add(PipelineCounter::RowsPersisted, result.written);
        self.stats.add(PipelineCounter::RowsFailed, result.failed);
        if result.discarded {
            self.stats.increment(PipelineCounter::BatchesDiscarded);
        } else if result.failed > 0 {
            log::warn!(
                "Flush completed: {} written, {} failed out of {} total",
                result.written,
                result.failed,
                result.total
            );
        } else {
            log::debug!("Successfully flushed {} rows", result.written);
        }

        result
    }

    async fn load_batch(&self, trigger: FlushTrigger) -> FlushResult {
        let total = self.buffer.len();
        let discarded = FlushResult {
            trigger,
            total,
            written: 0,
            failed: 0,
            discarded: true,
        };

        let mut session = match self.store.begin().await {
            Ok(session) => session,
            Err(e) => {
                log::error!("Bulk load could not start, discarding {total} payloads: {e}");
                return discarded;
            }
        };

        let mut failed = 0;
        for payload in &self.buffer {
            let correlation = correlate(payload.as_bytes(), &self.correlation_id_keys);
            let row = LogRow {
                correlation_id: &correlation.id,
                raw: payload.as_bytes(),
                structured: correlation.structured,
            };
            if let Err(e) = session.write_row(&row).await {
                log::error!("Failed to stage log row (req_id={:?}): {}", correlation.id, e);
                failed += 1;
            }
        }

        match session.commit().await {
            Ok(written) => FlushResult {
                trigger,
                total,
                written: usize::try_from(written).unwrap_or(usize::MAX),
                failed,
                discarded: false,
            },
            Err(e) => {
                log::error!("Bulk load failed to commit, discarding {total} payloads: {e}");
                discarded
            }
        }
    }
}
