//! Bounded queue between producers and the background worker.
//!
//! Enqueueing never blocks and never fails the caller: when the queue is at
//! capacity the new payload is dropped and counted. Delivery is at-most-once.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::DROP_LOG_EVERY;
use crate::error_handling::{PipelineCounter, PipelineStats};
use crate::record::EncodedPayload;

/// Receiving half, owned by the worker.
pub type QueueReceiver = mpsc::Receiver<EncodedPayload>;

/// Producer handle of the bounded queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BoundedQueue {
    tx: mpsc::Sender<EncodedPayload>,
    stats: Arc<PipelineStats>,
}

/// Creates a queue holding at most `capacity` payloads (at least one).
pub fn bounded_queue(capacity: usize, stats: Arc<PipelineStats>) -> (BoundedQueue, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (BoundedQueue { tx, stats }, rx)
}

impl BoundedQueue {
    /// Offers a payload to the worker without waiting.
    ///
    /// Returns `false` when the payload was dropped (queue full or worker gone).
    pub fn enqueue(&self, payload: EncodedPayload) -> bool {
        match self.tx.try_send(payload) {
            Ok(()) => {
                self.stats.increment(PipelineCounter::Enqueued);
                true
            }
            Err(TrySendError::Full(_)) => {
                let dropped = self.stats.increment(PipelineCounter::Dropped);
                if dropped == 1 || dropped % DROP_LOG_EVERY == 0 {
                    log::warn!(
                        "dropping log payload (buffer full, capacity {}); {} dropped so far",
                        self.tx.max_capacity(),
                        dropped
                    );
                }
                false
            }
            Err(TrySendError::Closed(_)) => {
                let dropped = self.stats.increment(PipelineCounter::Dropped);
                log::debug!("dropping log payload (sink closed); {dropped} dropped so far");
                false
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of payloads waiting for the worker.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
