//! Configuration constants.
//!
//! This module defines the defaults used when a configuration value is left
//! at zero or empty, plus the fixed names of the persisted schema.

use std::time::Duration;

/// Default number of payloads per bulk load.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Default flush period when the batch does not fill up.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(2);
/// Flush period of the persistent sink when composed through `LoggerConfig`.
pub const DEFAULT_LOGGER_MAX_WAIT: Duration = Duration::from_secs(5);
/// Default capacity of the bounded queue between producers and the worker.
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;
/// Service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "app";

/// Candidate payload keys for the correlation id, in priority order.
/// The first non-empty string value wins.
pub const DEFAULT_CORRELATION_ID_KEYS: &[&str] = &[
    "request_id",
    "req_id",
    "correlation_id",
    "X-Request-ID",
    "X-Correlation-ID",
    "requestid",
];

// Canonical payload keys written by the encoder
pub const TIME_KEY: &str = "ts";
pub const LEVEL_KEY: &str = "level";
pub const MESSAGE_KEY: &str = "msg";
pub const CALLER_KEY: &str = "caller";
/// Key the encoder uses for a correlation id attached directly to a record.
pub const CORRELATION_KEY: &str = "request_id";
/// Key of the backtrace attached to `error` and `fatal` records.
pub const STACK_KEY: &str = "stack";

// HTTP instrumentation
/// Maximum request body captured when body logging is on (64KB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Message of the one record emitted per completed request.
pub const HTTP_REQUEST_MESSAGE: &str = "http_request";
/// Request headers checked for a correlation id. Lookups are case-insensitive.
pub const REQUEST_ID_HEADERS: &[&str] = &["x-request-id", "x-correlation-id", "x-requestid"];

// Database pool (CLI)
/// Maximum connections held by the CLI pool.
pub const DB_MAX_CONNECTIONS: u32 = 4;
/// How long the CLI waits to acquire a connection.
pub const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Emit a backpressure warning on the first drop and then every N drops.
pub const DROP_LOG_EVERY: usize = 1000;
