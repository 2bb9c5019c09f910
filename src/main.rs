//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `logbatch` library that manages the
//! `logs` table:
//! - `migrate` creates the table and its indexes
//! - `drop` removes the table
//! - `retention` deletes (or with `--dry-run` counts) old rows
//!
//! Exit codes: 0 success, 1 database unreachable, 2 usage error, 3 operation failed.

use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::PgPool;

use logbatch::config::{Cli, Command, DB_ACQUIRE_TIMEOUT, DB_MAX_CONNECTIONS};
use logbatch::initialization::init_logger_with;
use logbatch::storage::{
    count_older_than, delete_older_than, drop_logs_table, ensure_logs_table, init_pg_pool,
};

const EXIT_CONNECT: i32 = 1;
const EXIT_OPERATION: i32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    // clap exits with status 2 on usage errors
    let cli = Cli::parse();

    init_logger_with(cli.log_level.into(), cli.log_format)
        .context("Failed to initialize logger")?;

    let timeout = Duration::from_secs(cli.timeout_seconds.max(1));

    let pool = match tokio::time::timeout(
        timeout,
        init_pg_pool(&cli.database_url, DB_MAX_CONNECTIONS, DB_ACQUIRE_TIMEOUT),
    )
    .await
    {
        Ok(Ok(pool)) => pool,
        Ok(Err(e)) => {
            eprintln!("logbatch error: could not connect to database: {e}");
            process::exit(EXIT_CONNECT);
        }
        Err(_) => {
            eprintln!("logbatch error: timed out connecting to database after {timeout:?}");
            process::exit(EXIT_CONNECT);
        }
    };

    let outcome = tokio::time::timeout(timeout, run_command(&pool, &cli.command)).await;
    pool.close().await;

    match outcome {
        Ok(Ok(summary)) => {
            println!("{summary}");
            Ok(())
        }
        Ok(Err(e)) => {
            eprintln!("logbatch error: {:#}", e);
            process::exit(EXIT_OPERATION);
        }
        Err(_) => {
            eprintln!("logbatch error: operation timed out after {timeout:?}");
            process::exit(EXIT_OPERATION);
        }
    }
}

async fn run_command(pool: &PgPool, command: &Command) -> Result<String> {
    match command {
        Command::Migrate => {
            ensure_logs_table(pool)
                .await
                .context("Failed to create logs table")?;
            Ok("✅ logs table is ready".to_string())
        }
        Command::Drop => {
            drop_logs_table(pool)
                .await
                .context("Failed to drop logs table")?;
            Ok("🗑️  logs table dropped".to_string())
        }
        Command::Retention {
            older_than,
            dry_run: true,
        } => {
            let count = count_older_than(pool, *older_than)
                .await
                .context("Failed to count old log rows")?;
            Ok(format!(
                "{count} row{} older than {older_than:?} would be deleted (dry run)",
                if count == 1 { "" } else { "s" }
            ))
        }
        Command::Retention {
            older_than,
            dry_run: false,
        } => {
            let deleted = delete_older_than(pool, *older_than)
                .await
                .context("Failed to delete old log rows")?;
            Ok(format!(
                "✅ Deleted {deleted} row{} older than {older_than:?}",
                if deleted == 1 { "" } else { "s" }
            ))
        }
    }
}
