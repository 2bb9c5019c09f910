//! Structured sinks.
//!
//! Every destination implements [`Sink`]: a level check, a synchronous
//! write, a flush, and a deadline-bounded close. [`FanoutSink`] composes any
//! number of them behind the same interface.

mod console;
mod fanout;
mod persistent;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error_handling::SinkError;
use crate::record::{Fields, Level, LogRecord};

pub use console::ConsoleSink;
pub use fanout::FanoutSink;
pub use persistent::PersistentSink;

/// A destination for log records.
///
/// `write` must not block on slow storage; sinks that persist remotely hand
/// the record to a background worker and return.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Whether a record at `level` would be written.
    fn accepts_level(&self, level: Level) -> bool;

    /// Writes one record. Records below the sink's threshold are ignored.
    fn write(&self, record: &LogRecord) -> Result<(), SinkError>;

    /// Flushes buffered output that can be flushed synchronously.
    fn flush(&self) -> Result<(), SinkError>;

    /// Stops the sink, waiting at most `deadline` for pending output.
    ///
    /// Calling it more than once is allowed; later calls return immediately
    /// once the first one completed.
    async fn close(&self, deadline: Duration) -> Result<(), SinkError>;

    /// Derives a sink with `fields` pre-bound on every record. The derived
    /// sink shares all output resources with `self`.
    fn with_fields(&self, fields: &Fields) -> Arc<dyn Sink>;
}
