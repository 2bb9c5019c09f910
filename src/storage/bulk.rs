//! Bulk-load abstraction used by the background worker.
//!
//! A flush opens one [`BulkSession`] per batch, stages every row through it
//! and commits once. Row staging failures are local to the row; a failure to
//! open or commit the session loses the whole batch.

use async_trait::async_trait;

use crate::error_handling::DatabaseError;

/// One row headed for the `logs` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRow<'a> {
    /// Best-effort correlation id; empty when none was found.
    pub correlation_id: &'a str,
    /// The payload exactly as it was enqueued.
    pub raw: &'a [u8],
    /// Whether `raw` parsed as a JSON object.
    pub structured: bool,
}

/// A store that can open bulk-load sessions.
#[async_trait]
pub trait BulkStore: Send + Sync {
    /// Opens a transaction for one batch.
    async fn begin(&self) -> Result<Box<dyn BulkSession>, DatabaseError>;
}

/// An open transaction accepting rows for a single bulk load.
#[async_trait]
pub trait BulkSession: Send {
    /// Stages one row. An error rejects this row only.
    async fn write_row(&mut self, row: &LogRow<'_>) -> Result<(), DatabaseError>;

    /// Runs the bulk-load finalize step and commits. Returns the number of
    /// rows committed.
    async fn commit(self: Box<Self>) -> Result<u64, DatabaseError>;
}
