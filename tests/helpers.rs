// Shared test helpers for pipeline tests.
//
// This module provides an in-memory bulk store and a shareable writer used
// across multiple test files.

#![allow(dead_code)] // Not every test file uses every helper

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use logbatch::storage::{BulkSession, BulkStore, LogRow};
use logbatch::DatabaseError;

/// One committed row.
#[derive(Debug, Clone)]
pub struct Row {
    pub req_id: String,
    pub raw: Vec<u8>,
}

impl Row {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.raw).expect("row should hold JSON")
    }
}

#[derive(Default)]
struct Inner {
    rows: Vec<Row>,
    batches: Vec<usize>,
    fail_begin: bool,
    commit_delay: Option<Duration>,
}

/// In-memory store that records every committed batch.
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.inner.lock().unwrap().rows.clone()
    }

    pub fn batches(&self) -> Vec<usize> {
        self.inner.lock().unwrap().batches.clone()
    }

    pub fn fail_begin(&self, fail: bool) {
        self.inner.lock().unwrap().fail_begin = fail;
    }

    pub fn slow_commits(&self, delay: Duration) {
        self.inner.lock().unwrap().commit_delay = Some(delay);
    }

    pub fn handle(&self) -> Arc<dyn BulkStore> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl BulkStore for RecordingStore {
    async fn begin(&self) -> Result<Box<dyn BulkSession>, DatabaseError> {
        if self.inner.lock().unwrap().fail_begin {
            return Err(DatabaseError::Unavailable("store is down".to_string()));
        }
        Ok(Box::new(RecordingSession {
            store: self.clone(),
            staged: Vec::new(),
        }))
    }
}

struct RecordingSession {
    store: RecordingStore,
    staged: Vec<Row>,
}

#[async_trait]
impl BulkSession for RecordingSession {
    async fn write_row(&mut self, row: &LogRow<'_>) -> Result<(), DatabaseError> {
        self.staged.push(Row {
            req_id: row.correlation_id.to_string(),
            raw: row.raw.to_vec(),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<u64, DatabaseError> {
        let delay = self.store.inner.lock().unwrap().commit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.store.inner.lock().unwrap();
        let n = self.staged.len();
        inner.rows.extend(self.staged);
        inner.batches.push(n);
        Ok(n as u64)
    }
}

/// Writer whose clones share one buffer, for console sink output.
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
