//! Test doubles for sink tests.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error_handling::SinkError;
use crate::record::{Fields, Level, LogRecord};
use crate::sink::Sink;

/// In-memory writer whose clones share one buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Records everything written to it. Can be told to fail writes.
#[derive(Clone)]
pub struct CaptureSink {
    level: Level,
    fields: Fields,
    records: Arc<Mutex<Vec<LogRecord>>>,
    fail_writes: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
}

impl CaptureSink {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            fields: Fields::new(),
            records: Arc::new(Mutex::new(Vec::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(level: Level) -> Self {
        let sink = Self::new(level);
        sink.fail_writes.store(true, Ordering::SeqCst);
        sink
    }

    /// Records written so far, with bound fields merged in.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for CaptureSink {
    fn accepts_level(&self, level: Level) -> bool {
        self.level.accepts(level)
    }

    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SinkError::Io(io::Error::other("capture sink told to fail")));
        }
        let mut merged = self.fields.clone();
        merged.extend(record.fields.clone());
        let mut record = record.clone();
        record.fields = merged;
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn close(&self, _deadline: Duration) -> Result<(), SinkError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn with_fields(&self, fields: &Fields) -> Arc<dyn Sink> {
        let mut child = self.clone();
        child.fields.extend(fields.clone());
        Arc::new(child)
    }
}
