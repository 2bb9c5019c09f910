// storage/schema.rs
// Lifecycle of the logs table

use sqlx::PgPool;

use crate::error_handling::DatabaseError;

/// DDL for the `logs` table and its indexes. Safe to run repeatedly.
pub const LOGS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id      BIGSERIAL PRIMARY KEY,
    ts      TIMESTAMPTZ NOT NULL DEFAULT now(),
    req_id  TEXT,
    raw     JSONB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_logs_ts ON logs (ts DESC);
CREATE INDEX IF NOT EXISTS idx_logs_req_id ON logs (req_id);
"#;

const DROP_LOGS_TABLE_SQL: &str = "DROP TABLE IF EXISTS logs";

/// Creates the logs table (and indexes) if they don't already exist.
pub async fn ensure_logs_table(pool: &PgPool) -> Result<(), DatabaseError> {
    // raw_sql runs the multi-statement script through the simple query protocol
    sqlx::raw_sql(LOGS_TABLE_DDL).execute(pool).await?;
    Ok(())
}

/// Drops the logs table if it exists.
pub async fn drop_logs_table(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query(DROP_LOGS_TABLE_SQL).execute(pool).await?;
    Ok(())
}
