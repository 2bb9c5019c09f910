//! Retention maintenance for the logs table.
//!
//! Not on the sink's runtime path; driven by the `logbatch retention` command.

use std::time::Duration;

use sqlx::PgPool;

use crate::error_handling::DatabaseError;

const DELETE_OLDER_THAN_SQL: &str =
    "DELETE FROM logs WHERE ts < now() - make_interval(secs => $1::double precision)";
const COUNT_OLDER_THAN_SQL: &str =
    "SELECT count(*) FROM logs WHERE ts < now() - make_interval(secs => $1::double precision)";

/// Deletes rows older than `older_than` and returns how many were removed.
pub async fn delete_older_than(pool: &PgPool, older_than: Duration) -> Result<u64, DatabaseError> {
    let result = sqlx::query(DELETE_OLDER_THAN_SQL)
        .bind(older_than.as_secs_f64())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Counts rows older than `older_than` without deleting them.
pub async fn count_older_than(pool: &PgPool, older_than: Duration) -> Result<i64, DatabaseError> {
    let count: i64 = sqlx::query_scalar(COUNT_OLDER_THAN_SQL)
        .bind(older_than.as_secs_f64())
        .fetch_one(pool)
        .await?;
    Ok(count)
}
