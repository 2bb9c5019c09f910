//! logbatch library: structured logging with batched PostgreSQL persistence
//!
//! This library accepts structured log records from application code and an
//! HTTP middleware, filters them by severity and delivers them to a console
//! sink and a persistent sink. The persistent sink never blocks producers:
//! records go through a bounded queue to a background worker that bulk-loads
//! them into a `logs` table with `COPY`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use logbatch::storage::{ensure_logs_table, init_pg_pool, PgLogStore};
//! use logbatch::{fields, Logger, LoggerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = init_pg_pool("postgres://localhost/app", 4, Duration::from_secs(5)).await?;
//! ensure_logs_table(&pool).await?;
//!
//! let config = LoggerConfig {
//!     service_name: "todos-api".to_string(),
//!     persistent: true,
//!     ..Default::default()
//! };
//! let logger = Logger::new(config, Some(Arc::new(PgLogStore::new(pool))))?;
//!
//! logger.info("todo created", fields! { "request_id" => "abc", "todo_id" => 7 })?;
//!
//! logger.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! The persistent sink requires a Tokio runtime. Create it (or the
//! [`Logger`] that owns it) from within an async context.

#![warn(missing_docs)]

pub mod config;
pub mod error_handling;
pub mod http;
pub mod initialization;
pub mod logger;
pub mod record;
pub mod sink;
pub mod storage;

// Re-export public API
pub use config::{HttpLogConfig, LogFormat, LoggerConfig, SinkConfig};
pub use error_handling::{
    DatabaseError, EncodeError, InitializationError, SinkError, StatsSnapshot,
};
pub use logger::Logger;
pub use record::{Fields, Level, LogRecord};
pub use sink::{ConsoleSink, FanoutSink, PersistentSink, Sink};
pub use storage::{BulkStore, PgLogStore};
