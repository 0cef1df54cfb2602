//! DuckDB connection handling

use std::path::Path;
use std::thread;
use std::time::Duration;

use duckdb::Connection;

use crate::domain::result::{Error, Result};

/// Maximum number of attempts when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
        || lower.contains("file is already open")
}

/// Open (or create) the database at `db_path`.
///
/// DuckDB allows one writing process per file, so another `strat` run or an
/// application holding the file makes the open fail. Those failures are
/// retried with exponential backoff before giving up.
pub fn open_database(db_path: &Path) -> Result<Connection> {
    let mut attempt = 0;
    loop {
        match try_open_connection(db_path) {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                let err_msg = e.to_string();
                if !is_retryable_error(&err_msg) || attempt + 1 >= MAX_RETRIES {
                    return Err(Error::Database(e));
                }

                let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                tracing::warn!(
                    path = %db_path.display(),
                    attempt = attempt + 1,
                    max_attempts = MAX_RETRIES,
                    "database busy, retrying in {}ms: {}",
                    delay.as_millis(),
                    err_msg
                );
                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

/// Open a private in-memory database
pub fn open_in_memory() -> Result<Connection> {
    let config = duckdb::Config::default().enable_autoload_extension(false)?;
    Ok(Connection::open_in_memory_with_flags(config)?)
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
///
/// The error returned by `body` is always the one surfaced; a failing
/// `ROLLBACK` is only logged.
pub fn with_transaction<T, F>(conn: &Connection, body: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    conn.execute_batch("BEGIN TRANSACTION")?;

    match body(conn) {
        Ok(value) => {
            if let Err(commit_err) = conn.execute_batch("COMMIT") {
                rollback(conn);
                return Err(Error::Database(commit_err));
            }
            Ok(value)
        }
        Err(e) => {
            rollback(conn);
            Err(e)
        }
    }
}

/// Execute `body` within a transaction that is always rolled back.
///
/// Used to look at what a change would do without keeping it.
pub fn with_rollback<T, F>(conn: &Connection, body: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    conn.execute_batch("BEGIN TRANSACTION")?;
    let result = body(conn);
    rollback(conn);
    result
}

fn rollback(conn: &Connection) {
    if let Err(e) = conn.execute_batch("ROLLBACK") {
        tracing::warn!("rollback failed: {}", e);
    }
}

/// Attempt to open a database connection (called by `open_database` with retry logic)
fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
    // Migrations must not depend on extensions cached in ~/.duckdb/extensions
    let config = duckdb::Config::default().enable_autoload_extension(false)?;
    Connection::open_with_flags(db_path, config)
}
