//! Shared test helpers for storage module tests.
//!
//! [`MemoryStore`] implements [`BulkStore`] in memory so the worker and the
//! sinks can be tested without a database. Failures are injected through
//! switches on the store.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error_handling::DatabaseError;
use crate::storage::bulk::{BulkSession, BulkStore, LogRow};

/// A row as the store saw it at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub correlation_id: String,
    pub raw: Vec<u8>,
    pub structured: bool,
}

#[derive(Default)]
struct State {
    rows: Vec<StoredRow>,
    committed_batches: Vec<usize>,
    commit_times: Vec<Instant>,
    begin_count: usize,
    reject_needle: Option<Vec<u8>>,
    fail_begin: bool,
    fail_commit: bool,
    commit_delay: Option<Duration>,
}

/// In-memory bulk store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn rows(&self) -> Vec<StoredRow> {
        self.lock().rows.clone()
    }

    /// Row counts of each committed batch, in commit order.
    pub fn committed_batches(&self) -> Vec<usize> {
        self.lock().committed_batches.clone()
    }

    pub fn commit_times(&self) -> Vec<Instant> {
        self.lock().commit_times.clone()
    }

    pub fn begin_count(&self) -> usize {
        self.lock().begin_count
    }

    /// Rejects any row whose raw bytes contain `needle`.
    pub fn reject_rows_containing(&self, needle: &str) {
        self.lock().reject_needle = Some(needle.as_bytes().to_vec());
    }

    pub fn fail_begin(&self, fail: bool) {
        self.lock().fail_begin = fail;
    }

    pub fn fail_commit(&self, fail: bool) {
        self.lock().fail_commit = fail;
    }

    /// Makes every commit sleep for `delay` first.
    pub fn stall_commits(&self, delay: Duration) {
        self.lock().commit_delay = Some(delay);
    }
}

#[async_trait]
impl BulkStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn BulkSession>, DatabaseError> {
        let mut state = self.lock();
        state.begin_count += 1;
        if state.fail_begin {
            return Err(DatabaseError::Begin(sqlx::Error::PoolClosed));
        }
        Ok(Box::new(MemorySession {
            store: self.clone(),
            staged: Vec::new(),
        }))
    }
}

struct MemorySession {
    store: MemoryStore,
    staged: Vec<StoredRow>,
}

#[async_trait]
impl BulkSession for MemorySession {
    async fn write_row(&mut self, row: &LogRow<'_>) -> Result<(), DatabaseError> {
        let rejected = self
            .store
            .lock()
            .reject_needle
            .as_deref()
            .is_some_and(|needle| row.raw.windows(needle.len()).any(|w| w == needle));
        if rejected {
            return Err(DatabaseError::RowRejected {
                reason: "rejected by test store".to_string(),
            });
        }
        self.staged.push(StoredRow {
            correlation_id: row.correlation_id.to_string(),
            raw: row.raw.to_vec(),
            structured: row.structured,
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<u64, DatabaseError> {
        let delay = self.store.lock().commit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.store.lock();
        if state.fail_commit {
            return Err(DatabaseError::Commit(sqlx::Error::Protocol(
                "commit refused by test store".to_string(),
            )));
        }
        let count = self.staged.len();
        state.rows.extend(self.staged);
        state.committed_batches.push(count);
        state.commit_times.push(Instant::now());
        Ok(count as u64)
    }
}
