//! Top-level logger.
//!
//! [`Logger`] is the handle application code holds. It owns a fan-out of the
//! enabled sinks with the `service` field pre-bound, and is passed explicitly
//! to whoever needs it; there is no global instance.

use std::backtrace::Backtrace;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{LoggerConfig, SinkConfig, DEFAULT_SERVICE_NAME};
use crate::error_handling::{InitializationError, SinkError, StatsSnapshot};
use crate::record::{Fields, Level, LogRecord, Value};
use crate::sink::{ConsoleSink, FanoutSink, PersistentSink, Sink};
use crate::storage::bulk::BulkStore;

/// Builds a [`Fields`] map from `key => value` pairs.
///
/// Values go through `serde_json::Value::from`, so strings, numbers, booleans
/// and `Value`s all work.
///
/// ```
/// let fields = logbatch::fields! { "user_id" => 42, "plan" => "pro" };
/// assert_eq!(fields["plan"], "pro");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::record::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::record::Fields::new();
        $(
            fields.insert(($key).to_string(), $crate::record::Value::from($value));
        )+
        fields
    }};
}

/// Application-facing logger. Cheap to clone.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Sink>,
    persistent: Option<Arc<PersistentSink>>,
}

impl Logger {
    /// Composes the sinks enabled in `config`.
    ///
    /// Fails with [`InitializationError::NoSinkEnabled`] if neither sink is
    /// enabled and with [`InitializationError::MissingStore`] if the
    /// persistent sink is enabled without a store. The persistent sink needs
    /// a running Tokio runtime.
    pub fn new(
        config: LoggerConfig,
        store: Option<Arc<dyn BulkStore>>,
    ) -> Result<Self, InitializationError> {
        if !config.console && !config.persistent {
            return Err(InitializationError::NoSinkEnabled);
        }

        let mut members: Vec<Arc<dyn Sink>> = Vec::new();
        if config.console {
            members.push(Arc::new(ConsoleSink::stdout(
                config.level,
                config.console_format,
            )));
        }

        let mut persistent = None;
        if config.persistent {
            let store = store.ok_or(InitializationError::MissingStore)?;
            let sink_config = SinkConfig {
                level: config.level,
                ..config.sink
            };
            let sink = Arc::new(PersistentSink::new(store, sink_config)?);
            members.push(sink.clone());
            persistent = Some(sink);
        }

        let service_name = if config.service_name.trim().is_empty() {
            DEFAULT_SERVICE_NAME.to_string()
        } else {
            config.service_name
        };
        let mut service = Fields::new();
        service.insert("service".to_string(), Value::String(service_name));

        Ok(Self {
            sink: FanoutSink::new(members).with_fields(&service),
            persistent,
        })
    }

    /// Wraps an already composed sink.
    pub fn from_sink(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            persistent: None,
        }
    }

    /// Whether any sink would write a record at `level`.
    pub fn enabled(&self, level: Level) -> bool {
        self.sink.accepts_level(level)
    }

    /// Writes a fully built record.
    pub fn log(&self, record: LogRecord) -> Result<(), SinkError> {
        if !self.sink.accepts_level(record.level) {
            return Ok(());
        }
        self.sink.write(&record)
    }

    #[track_caller]
    fn emit(&self, level: Level, message: String, fields: Fields) -> Result<(), SinkError> {
        if !self.sink.accepts_level(level) {
            return Ok(());
        }
        let caller = Location::caller();
        let mut record = LogRecord::new(level, message)
            .with_fields(fields)
            .with_caller(format!("{}:{}", caller.file(), caller.line()));
        if level >= Level::Error {
            record = record.with_stack(Backtrace::force_capture().to_string());
        }
        self.sink.write(&record)
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, fields: Fields) -> Result<(), SinkError> {
        self.emit(Level::Debug, message.into(), fields)
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, fields: Fields) -> Result<(), SinkError> {
        self.emit(Level::Info, message.into(), fields)
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, fields: Fields) -> Result<(), SinkError> {
        self.emit(Level::Warn, message.into(), fields)
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>, fields: Fields) -> Result<(), SinkError> {
        self.emit(Level::Error, message.into(), fields)
    }

    /// Records at `Fatal`. The process keeps running.
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>, fields: Fields) -> Result<(), SinkError> {
        self.emit(Level::Fatal, message.into(), fields)
    }

    /// Child logger with `fields` bound on every record. Shares all sinks
    /// and the persistent worker with `self`.
    pub fn with_fields(&self, fields: Fields) -> Logger {
        Logger {
            sink: self.sink.with_fields(&fields),
            persistent: self.persistent.clone(),
        }
    }

    pub fn flush(&self) -> Result<(), SinkError> {
        self.sink.flush()
    }

    /// Flushes synchronous sinks, then closes every sink within `deadline`.
    ///
    /// Returns [`SinkError::ShutdownTimeout`] (possibly nested) if the
    /// persistent worker is still draining at the deadline; it finishes in
    /// the background.
    pub async fn shutdown(&self, deadline: Duration) -> Result<(), SinkError> {
        if let Err(e) = self.sink.flush() {
            log::warn!("Flush before shutdown failed: {e}");
        }
        self.sink.close(deadline).await
    }

    /// Counters of the persistent pipeline, if one is enabled.
    pub fn stats(&self) -> Option<StatsSnapshot> {
        self.persistent.as_ref().map(|p| p.stats())
    }
}
