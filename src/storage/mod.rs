// storage/mod.rs
// Database operations module

pub mod batch;
pub mod bulk;
pub mod pool;
pub mod postgres;
pub mod retention;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use batch::{start_batch_writer, BatchWriterHandle, FlushResult, FlushTrigger};
pub use bulk::{BulkSession, BulkStore, LogRow};
pub use pool::init_pg_pool;
pub use postgres::PgLogStore;
pub use retention::{count_older_than, delete_older_than};
pub use schema::{drop_logs_table, ensure_logs_table};
