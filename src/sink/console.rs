//! Synchronous console sink.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use colored::*;

use crate::config::LogFormat;
use crate::error_handling::SinkError;
use crate::record::{Fields, JsonEncoder, Level, LogRecord};

use super::Sink;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes each record as one line to stdout (or any writer).
///
/// Clones made through [`Sink::with_fields`] share the writer, so lines from
/// parent and child never interleave mid-line.
pub struct ConsoleSink {
    level: Level,
    format: LogFormat,
    encoder: JsonEncoder,
    out: SharedWriter,
}

impl ConsoleSink {
    /// Console sink on stdout.
    pub fn stdout(level: Level, format: LogFormat) -> Self {
        Self::with_writer(level, format, io::stdout())
    }

    /// Console sink on an arbitrary writer.
    pub fn with_writer<W>(level: Level, format: LogFormat, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            level,
            format,
            encoder: JsonEncoder::new(),
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    fn render(&self, record: &LogRecord) -> Result<Vec<u8>, SinkError> {
        match self.format {
            LogFormat::Json => {
                let mut line = self.encoder.encode(record)?.into_vec();
                line.push(b'\n');
                Ok(line)
            }
            LogFormat::Plain => Ok(render_plain(record, self.encoder.static_fields()).into_bytes()),
        }
    }
}

/// `<ts> [LEVEL] msg key=value ...` with a colorized level.
fn render_plain(record: &LogRecord, static_fields: &Fields) -> String {
    let level = record.level.as_str().to_uppercase();
    let colored_level = match record.level {
        Level::Fatal => level.red().bold(),
        Level::Error => level.red(),
        Level::Warn => level.yellow(),
        Level::Info => level.green(),
        Level::Debug => level.blue(),
    };

    let mut line = format!(
        "{} [{}] {}",
        record.ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        colored_level,
        record.message
    );
    if let Some(caller) = &record.caller {
        line.push_str(&format!(" {}", caller.cyan()));
    }
    for (k, v) in static_fields
        .iter()
        .filter(|(k, _)| !record.fields.contains_key(*k))
        .chain(record.fields.iter())
    {
        line.push_str(&format!(" {}={}", k, v));
    }
    if let Some(id) = &record.correlation_id {
        line.push_str(&format!(" request_id={id}"));
    }
    line.push('\n');
    if let Some(stack) = &record.stack {
        line.push_str(stack);
        if !stack.ends_with('\n') {
            line.push('\n');
        }
    }
    line
}

#[async_trait]
impl Sink for ConsoleSink {
    fn accepts_level(&self, level: Level) -> bool {
        self.level.accepts(level)
    }

    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        if !self.accepts_level(record.level) {
            return Ok(());
        }
        let line = self.render(record)?;
        let mut out = self.out.lock().map_err(|_| SinkError::Poisoned)?;
        out.write_all(&line)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut out = self.out.lock().map_err(|_| SinkError::Poisoned)?;
        out.flush()?;
        Ok(())
    }

    async fn close(&self, _deadline: Duration) -> Result<(), SinkError> {
        self.flush()
    }

    fn with_fields(&self, fields: &Fields) -> Arc<dyn Sink> {
        Arc::new(ConsoleSink {
            level: self.level,
            format: self.format,
            encoder: self.encoder.with_fields(fields),
            out: Arc::clone(&self.out),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_helpers::SharedBuffer;
    use serde_json::{json, Value};

    #[test]
    fn test_json_console_writes_one_object_per_line() {
        let buf = SharedBuffer::new();
        let sink = ConsoleSink::with_writer(Level::Info, LogFormat::Json, buf.clone());

        sink.write(&LogRecord::new(Level::Info, "first").with_field("n", 1))
            .unwrap();
        sink.write(&LogRecord::new(Level::Error, "second")).unwrap();

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["msg"], "first");
        assert_eq!(first["n"], 1);
        let second: Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["level"], "error");
    }

    #[test]
    fn test_records_below_threshold_are_ignored() {
        let buf = SharedBuffer::new();
        let sink = ConsoleSink::with_writer(Level::Warn, LogFormat::Json, buf.clone());

        assert!(!sink.accepts_level(Level::Info));
        sink.write(&LogRecord::new(Level::Info, "quiet")).unwrap();
        assert!(buf.contents().is_empty());
    }

    #[test]
    fn test_plain_console_contains_message_and_fields() {
        let buf = SharedBuffer::new();
        let sink = ConsoleSink::with_writer(Level::Debug, LogFormat::Plain, buf.clone());

        sink.write(
            &LogRecord::new(Level::Warn, "disk almost full")
                .with_field("pct", 97)
                .with_correlation_id("req-9"),
        )
        .unwrap();

        let out = buf.contents();
        assert!(out.contains("WARN"));
        assert!(out.contains("disk almost full"));
        assert!(out.contains("pct=97"));
        assert!(out.contains("request_id=req-9"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_plain_console_prints_stack_below_the_line() {
        let buf = SharedBuffer::new();
        let sink = ConsoleSink::with_writer(Level::Info, LogFormat::Plain, buf.clone());

        sink.write(&LogRecord::new(Level::Error, "boom").with_stack("  0: main"))
            .unwrap();

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("boom"));
        assert_eq!(lines[1], "  0: main");
    }

    #[test]
    fn test_with_fields_shares_writer_and_binds_fields() {
        let buf = SharedBuffer::new();
        let parent = ConsoleSink::with_writer(Level::Info, LogFormat::Json, buf.clone());
        let mut fields = Fields::new();
        fields.insert("service".into(), json!("billing"));
        let child = parent.with_fields(&fields);

        parent.write(&LogRecord::new(Level::Info, "from parent")).unwrap();
        child.write(&LogRecord::new(Level::Info, "from child")).unwrap();

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        let parent_line: Value = serde_json::from_str(&lines[0]).unwrap();
        let child_line: Value = serde_json::from_str(&lines[1]).unwrap();
        assert!(parent_line.get("service").is_none());
        assert_eq!(child_line["service"], "billing");
    }
}
