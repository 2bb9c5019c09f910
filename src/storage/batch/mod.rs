//! Batched persistence of encoded log payloads.
//!
//! Producers push payloads into a [`BoundedQueue`]; one background task owns
//! a [`BatchWriter`] and flushes it when the batch is full, when the flush
//! timer fires, and once more on shutdown after draining the queue.

pub mod correlation;
mod queue;
mod types;
mod writer;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::SinkConfig;
use crate::error_handling::{PipelineStats, StatsSnapshot};
use crate::storage::bulk::BulkStore;

pub use queue::{bounded_queue, BoundedQueue, QueueReceiver};
pub use types::{FlushResult, FlushTrigger};
pub use writer::BatchWriter;

/// Handles returned by [`start_batch_writer`].
pub struct BatchWriterHandle {
    /// Producer side of the bounded queue.
    pub queue: BoundedQueue,
    /// Cancelling this token asks the worker to drain and stop.
    pub stop: CancellationToken,
    /// Resolves with the final counters once the worker is done.
    pub task: JoinHandle<StatsSnapshot>,
    /// Counters shared with the worker.
    pub stats: Arc<PipelineStats>,
}

/// Starts the batch writer task.
///
/// Must be called from within a Tokio runtime.
pub fn start_batch_writer(store: Arc<dyn BulkStore>, config: &SinkConfig) -> BatchWriterHandle {
    let stats = Arc::new(PipelineStats::new());
    let (queue, rx) = bounded_queue(config.buffer_size, Arc::clone(&stats));
    let writer = BatchWriter::new(
        store,
        config.batch_size,
        config.correlation_id_keys.clone(),
        Arc::clone(&stats),
    );
    let stop = CancellationToken::new();

    let task = tokio::spawn(run_batch_writer(
        writer,
        rx,
        stop.clone(),
        config.max_wait,
    ));

    BatchWriterHandle {
        queue,
        stop,
        task,
        stats,
    }
}

/// Worker loop. Flushes run inline, so the queue is not read while a flush
/// is in progress and `max_wait` is a lower bound on flush latency.
pub async fn run_batch_writer(
    mut writer: BatchWriter,
    mut rx: QueueReceiver,
    stop: CancellationToken,
    max_wait: Duration,
) -> StatsSnapshot {
    let max_wait = if max_wait.is_zero() {
        Duration::from_millis(1)
    } else {
        max_wait
    };
    let mut ticker = interval_at(Instant::now() + max_wait, max_wait);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = stop.cancelled() => {
                log::debug!("Batch writer stop requested, draining queue...");
                // Refuse new payloads but keep everything already queued.
                rx.close();
                while let Some(payload) = rx.recv().await {
                    if writer.push(payload) {
                        writer.flush(FlushTrigger::Shutdown).await;
                    }
                }
                writer.flush(FlushTrigger::Shutdown).await;
                break;
            }

            _ = ticker.tick() => {
                writer.flush(FlushTrigger::Timer).await;
            }

            payload = rx.recv() => {
                match payload {
                    Some(payload) => {
                        if writer.push(payload) {
                            writer.flush(FlushTrigger::Size).await;
                            ticker.reset();
                        }
                    }
                    None => {
                        log::info!("Batch writer channel closed, flushing remaining payloads...");
                        writer.flush(FlushTrigger::Shutdown).await;
                        break;
                    }
                }
            }
        }
    }

    let snapshot = writer.stats().snapshot();
    log::info!(
        "Batch writer shutdown complete ({} rows persisted, {} failed, {} dropped)",
        snapshot.rows_persisted,
        snapshot.rows_failed,
        snapshot.dropped
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EncodedPayload;
    use crate::storage::test_helpers::MemoryStore;

    fn config(batch_size: usize, max_wait_ms: u64, buffer_size: usize) -> SinkConfig {
        SinkConfig {
            batch_size,
            max_wait: Duration::from_millis(max_wait_ms),
            buffer_size,
            ..Default::default()
        }
    }

    fn payload(i: usize) -> EncodedPayload {
        EncodedPayload::from(format!("{{\"msg\":\"m{i}\"}}").into_bytes())
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_then_size_triggered_flushes() {
        let store = MemoryStore::new();
        let start = Instant::now();
        let handle = start_batch_writer(Arc::new(store.clone()), &config(2, 50, 100));

        assert!(handle.queue.enqueue(payload(1)));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.committed_batches(), vec![1], "timer should flush the lone record");

        assert!(handle.queue.enqueue(payload(2)));
        assert!(handle.queue.enqueue(payload(3)));
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(store.committed_batches(), vec![1, 2]);
        let times = store.commit_times();
        assert!(
            times[1] - start < Duration::from_millis(100),
            "size-triggered flush must not wait for the next tick"
        );

        handle.stop.cancel();
        let snapshot = handle.task.await.unwrap();
        assert_eq!(snapshot.rows_persisted, 3);
        assert_eq!(snapshot.flushes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_tick_on_empty_batch_does_nothing() {
        let store = MemoryStore::new();
        let handle = start_batch_writer(Arc::new(store.clone()), &config(10, 20, 100));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.begin_count(), 0);

        handle.stop.cancel();
        handle.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_drains_queue_and_flushes_remaining() {
        let store = MemoryStore::new();
        let handle = start_batch_writer(Arc::new(store.clone()), &config(4, 60_000, 100));

        for i in 0..10 {
            assert!(handle.queue.enqueue(payload(i)));
        }
        handle.stop.cancel();
        let snapshot = handle.task.await.unwrap();

        assert_eq!(snapshot.rows_persisted, 10);
        let rows = store.rows();
        let raws: Vec<Vec<u8>> = rows.into_iter().map(|r| r.raw).collect();
        let expected: Vec<Vec<u8>> = (0..10).map(|i| payload(i).into_vec()).collect();
        assert_eq!(raws, expected, "FIFO order is preserved through shutdown");
        assert!(store.committed_batches().iter().all(|&n| n <= 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_after_stop_is_dropped() {
        let store = MemoryStore::new();
        let handle = start_batch_writer(Arc::new(store.clone()), &config(4, 1000, 100));

        handle.stop.cancel();
        handle.task.await.unwrap();

        assert!(!handle.queue.enqueue(payload(0)));
        assert_eq!(handle.stats.snapshot().dropped, 1);
        assert!(store.rows().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_stops_when_all_producers_are_gone() {
        let store = MemoryStore::new();
        let BatchWriterHandle { queue, task, .. } =
            start_batch_writer(Arc::new(store.clone()), &config(100, 60_000, 100));

        queue.enqueue(payload(0));
        drop(queue);

        let snapshot = task.await.unwrap();
        assert_eq!(snapshot.rows_persisted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_recovers_after_discarded_batch() {
        let store = MemoryStore::new();
        store.fail_begin(true);
        let handle = start_batch_writer(Arc::new(store.clone()), &config(1, 1000, 100));

        handle.queue.enqueue(payload(0));
        tokio::time::sleep(Duration::from_millis(1)).await;
        store.fail_begin(false);
        handle.queue.enqueue(payload(1));

        handle.stop.cancel();
        let snapshot = handle.task.await.unwrap();
        assert_eq!(snapshot.batches_discarded, 1);
        assert_eq!(snapshot.rows_persisted, 1);
        assert_eq!(store.rows()[0].raw, payload(1).into_vec());
    }
}
