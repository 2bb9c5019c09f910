//! PostgreSQL implementation of the bulk-load protocol using `COPY ... FROM STDIN`.
//!
//! Rows are staged in COPY text format while the transaction is open, then
//! streamed in one `COPY logs (req_id, raw)` before the commit.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::Transaction;

use crate::error_handling::DatabaseError;

use super::bulk::{BulkSession, BulkStore, LogRow};

const COPY_LOGS_SQL: &str = "COPY logs (req_id, raw) FROM STDIN";

/// Bulk store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub fn new(pool: PgPool) -> Self {
        PgLogStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BulkStore for PgLogStore {
    async fn begin(&self) -> Result<Box<dyn BulkSession>, DatabaseError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::Begin)?;
        Ok(Box::new(PgBulkSession {
            tx,
            staged: Vec::new(),
            rows: 0,
        }))
    }
}

struct PgBulkSession {
    tx: Transaction<'static, Postgres>,
    staged: Vec<u8>,
    rows: u64,
}

#[async_trait]
impl BulkSession for PgBulkSession {
    async fn write_row(&mut self, row: &LogRow<'_>) -> Result<(), DatabaseError> {
        encode_copy_row(&mut self.staged, row)?;
        self.rows += 1;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<u64, DatabaseError> {
        let PgBulkSession {
            mut tx,
            staged,
            rows,
        } = *self;

        if rows > 0 {
            let mut copy = tx
                .copy_in_raw(COPY_LOGS_SQL)
                .await
                .map_err(DatabaseError::Prepare)?;
            let sent = copy.send(staged).await.map(|_| ());
            if let Err(e) = sent {
                if let Err(abort_err) = copy.abort("staged data could not be sent").await {
                    log::debug!("COPY abort after send failure also failed: {abort_err}");
                }
                return Err(DatabaseError::Finalize(e));
            }
            let copied = copy.finish().await.map_err(DatabaseError::Finalize)?;
            if copied != rows {
                log::warn!("COPY reported {copied} rows, {rows} were staged");
            }
        }

        tx.commit().await.map_err(DatabaseError::Commit)?;
        Ok(rows)
    }
}

/// Appends one COPY text-format line (`req_id \t raw \n`) to `buf`.
///
/// Payloads that are not JSON objects are stored as a JSON string holding
/// the original text so the `jsonb` column accepts them. Rows `jsonb` can
/// never hold (NUL bytes, `\u0000` escapes) are rejected without touching
/// `buf`.
pub(crate) fn encode_copy_row(buf: &mut Vec<u8>, row: &LogRow<'_>) -> Result<(), DatabaseError> {
    if row.raw.contains(&0) || row.correlation_id.contains('\0') {
        return Err(DatabaseError::RowRejected {
            reason: "payload contains a NUL byte".to_string(),
        });
    }

    let raw_text = if row.structured {
        match std::str::from_utf8(row.raw) {
            Ok(text) => text.to_string(),
            Err(e) => {
                return Err(DatabaseError::RowRejected {
                    reason: format!("payload is not valid UTF-8: {e}"),
                })
            }
        }
    } else {
        serde_json::to_string(&String::from_utf8_lossy(row.raw)).map_err(|e| {
            DatabaseError::RowRejected {
                reason: format!("payload could not be wrapped as JSON: {e}"),
            }
        })?
    };

    if has_nul_escape(&raw_text) {
        return Err(DatabaseError::RowRejected {
            reason: "payload contains a \\u0000 escape, unsupported by jsonb".to_string(),
        });
    }

    push_copy_text(buf, row.correlation_id);
    buf.push(b'\t');
    push_copy_text(buf, &raw_text);
    buf.push(b'\n');
    Ok(())
}

fn push_copy_text(buf: &mut Vec<u8>, value: &str) {
    for b in value.bytes() {
        match b {
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            _ => buf.push(b),
        }
    }
}

fn has_nul_escape(json: &str) -> bool {
    let bytes = json.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if bytes[i + 1..].starts_with(b"u0000") {
                return true;
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    false
}
