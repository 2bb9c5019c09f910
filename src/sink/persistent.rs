//! Batching persistent sink.
//!
//! `write` encodes the record and offers it to a bounded queue; a background
//! task batches payloads and bulk-loads them into the store. Producers never
//! wait on the database.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::SinkConfig;
use crate::error_handling::{InitializationError, PipelineStats, SinkError, StatsSnapshot};
use crate::record::{Fields, JsonEncoder, Level, LogRecord};
use crate::storage::batch::{start_batch_writer, BatchWriterHandle, BoundedQueue};
use crate::storage::bulk::BulkStore;

use super::Sink;

/// Worker lifecycle shared by a sink and every sink derived from it.
struct Lifecycle {
    stop: CancellationToken,
    // Taken by the close call that observes the worker finishing.
    task: Mutex<Option<JoinHandle<StatsSnapshot>>>,
    stats: Arc<PipelineStats>,
}

/// Sink that persists records in batches through a [`BulkStore`].
pub struct PersistentSink {
    level: Level,
    encoder: JsonEncoder,
    queue: BoundedQueue,
    lifecycle: Arc<Lifecycle>,
}

impl PersistentSink {
    /// Starts the background worker and returns the sink.
    ///
    /// Zero or empty config values are replaced by defaults. Fails if called
    /// outside a Tokio runtime.
    pub fn new(store: Arc<dyn BulkStore>, config: SinkConfig) -> Result<Self, InitializationError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(InitializationError::InvalidConfig(
                "persistent sink must be created inside a Tokio runtime".to_string(),
            ));
        }
        let config = config.normalized();

        let BatchWriterHandle {
            queue,
            stop,
            task,
            stats,
        } = start_batch_writer(store, &config);

        log::debug!(
            "Persistent sink started (level={}, batch_size={}, max_wait={:?}, buffer_size={})",
            config.level,
            config.batch_size,
            config.max_wait,
            config.buffer_size
        );

        Ok(Self {
            level: config.level,
            encoder: JsonEncoder::new(),
            queue,
            lifecycle: Arc::new(Lifecycle {
                stop,
                task: Mutex::new(Some(task)),
                stats,
            }),
        })
    }

    /// Current pipeline counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.lifecycle.stats.snapshot()
    }
}

#[async_trait]
impl Sink for PersistentSink {
    fn accepts_level(&self, level: Level) -> bool {
        self.level.accepts(level)
    }

    /// Never fails because of storage. A full queue drops the payload and
    /// counts it; only encoding errors reach the caller.
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        if !self.accepts_level(record.level) {
            return Ok(());
        }
        let payload = self.encoder.encode(record)?;
        self.queue.enqueue(payload);
        Ok(())
    }

    /// Nothing to do: the worker flushes on size, on its timer and on close.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Signals the worker to drain and waits for it until `deadline` elapses.
    ///
    /// On timeout the worker keeps running; a later call can wait again.
    async fn close(&self, deadline: Duration) -> Result<(), SinkError> {
        let expires = Instant::now() + deadline;
        self.lifecycle.stop.cancel();

        let mut task = timeout_at(expires, self.lifecycle.task.lock())
            .await
            .map_err(|_| SinkError::ShutdownTimeout(deadline))?;
        let Some(handle) = task.as_mut() else {
            return Ok(());
        };

        let outcome = timeout_at(expires, handle).await;
        match outcome {
            Ok(Ok(snapshot)) => {
                task.take();
                log::debug!(
                    "Persistent sink closed ({} enqueued, {} persisted, {} dropped)",
                    snapshot.enqueued,
                    snapshot.rows_persisted,
                    snapshot.dropped
                );
                Ok(())
            }
            Ok(Err(e)) => {
                task.take();
                log::error!("Batch writer task failed: {e}");
                Err(SinkError::WorkerPanicked(e.to_string()))
            }
            Err(_) => {
                log::warn!(
                    "Batch writer still draining after {:?}; leaving it to finish in background",
                    deadline
                );
                Err(SinkError::ShutdownTimeout(deadline))
            }
        }
    }

    fn with_fields(&self, fields: &Fields) -> Arc<dyn Sink> {
        Arc::new(PersistentSink {
            level: self.level,
            encoder: self.encoder.with_fields(fields),
            queue: self.queue.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
        })
    }
}
