//! Error type definitions.
//!
//! This module defines the error taxonomy used throughout the pipeline. Only
//! [`InitializationError`] is ever allowed to halt a caller; everything raised
//! on the persistence path is logged and absorbed by the background worker.

use std::time::Duration;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for logger construction failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Neither the console nor the persistent sink was enabled.
    #[error("no logging sink enabled (console=false and persistent=false)")]
    NoSinkEnabled,

    /// The persistent sink was enabled without a storage handle.
    #[error("persistent sink is enabled but no storage handle was provided")]
    MissingStore,

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error installing the diagnostics logger.
    #[error("Logger initialization error: {0}")]
    Logger(#[from] SetLoggerError),
}

/// Error raised while turning a record into its JSON payload.
///
/// The record is dropped and the error is returned to the producer call site
/// only; nothing is written to any sink.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// A value could not be serialized by `serde_json`.
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A field value serialized to something that is not representable in a
    /// JSON object member (for example a map with non-string keys).
    #[error("field `{key}` cannot be represented: {reason}")]
    UnsupportedField {
        /// Name of the offending field.
        key: String,
        /// What went wrong.
        reason: String,
    },
}

/// Error types for database operations.
///
/// `Begin`, `Prepare`, `Finalize` and `Commit` discard the whole in-flight
/// batch. `RowRejected` only affects the row it names.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The transaction could not be opened.
    #[error("begin transaction failed: {0}")]
    Begin(#[source] sqlx::Error),

    /// The bulk-load statement could not be prepared.
    #[error("prepare bulk load failed: {0}")]
    Prepare(#[source] sqlx::Error),

    /// The bulk-load finalize step failed.
    #[error("finalize bulk load failed: {0}")]
    Finalize(#[source] sqlx::Error),

    /// The commit failed.
    #[error("commit failed: {0}")]
    Commit(#[source] sqlx::Error),

    /// A single row could not be staged.
    #[error("row rejected: {reason}")]
    RowRejected {
        /// Why the row was rejected.
        reason: String,
    },

    /// SQL execution error outside the bulk-load path.
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// The store is not reachable for a reason other than SQL.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`crate::sink::Sink`] operations.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The record could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Writing to an output stream failed.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A sink's internal lock was poisoned by a panicking writer.
    #[error("sink writer lock poisoned")]
    Poisoned,

    /// The background worker did not finish draining before the deadline.
    ///
    /// This is recoverable: the worker keeps running and completes on its own.
    #[error("shutdown deadline of {0:?} exceeded; worker still draining in background")]
    ShutdownTimeout(Duration),

    /// The background worker panicked.
    #[error("background worker panicked: {0}")]
    WorkerPanicked(String),

    /// Several member sinks failed.
    #[error("{} sinks failed: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<SinkError>),
}

impl SinkError {
    /// Folds a list of member failures into a single error, if there are any.
    pub fn from_many(mut errors: Vec<SinkError>) -> Option<SinkError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(SinkError::Multiple(errors)),
        }
    }

    /// Returns true if this error (or any nested error) is a shutdown timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            SinkError::ShutdownTimeout(_) => true,
            SinkError::Multiple(errors) => errors.iter().any(SinkError::is_timeout),
            _ => false,
        }
    }
}

fn join_errors(errors: &[SinkError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
