//! Database connection pool management.
//!
//! This module initializes the PostgreSQL pool used by the persistent sink
//! and by the schema/retention commands.

use std::time::Duration;

use log::{error, info};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error_handling::DatabaseError;

/// Initializes and returns a PostgreSQL connection pool.
///
/// Connecting eagerly doubles as a ping: an unreachable server fails here
/// rather than on the first flush.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection URL
/// * `max_connections` - Upper bound on pooled connections
/// * `acquire_timeout` - How long a caller waits for a free connection
pub async fn init_pg_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, DatabaseError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            DatabaseError::Sql(e)
        })?;

    info!(
        "Database pool ready (max_connections={}, acquire_timeout={:?})",
        max_connections.max(1),
        acquire_timeout
    );
    Ok(pool)
}
