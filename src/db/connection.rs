use std::fs;
use std::path::Path;

use rusqlite::Connection;

use crate::error::WeekplanError;

use super::migrations;

/// Open an existing database. Returns error if not initialized.
pub fn open_db(path: &Path) -> Result<Connection, WeekplanError> {
    if !path.exists() {
        return Err(WeekplanError::not_initialized());
    }
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    // Idempotent; upgrades databases created by older builds.
    migrations::run_migrations(&conn)?;
    tracing::debug!(path = %path.display(), "database opened");
    Ok(conn)
}

/// Initialize the database: create directories, database, and run migrations.
pub fn init_db(path: &Path) -> Result<Connection, WeekplanError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    tracing::debug!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Fresh private database with the full schema. Used by tests and tooling.
pub fn open_in_memory() -> Result<Connection, WeekplanError> {
    let conn = Connection::open_in_memory()?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<(), WeekplanError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run `f` inside a transaction, committing on success and rolling back on error.
///
/// The outermost call takes the write lock up front (`BEGIN IMMEDIATE`) so that
/// read-check-write sequences from separate processes serialize. Nested calls
/// use a savepoint.
pub fn with_transaction<T, F>(conn: &Connection, f: F) -> Result<T, WeekplanError>
where
    F: FnOnce() -> Result<T, WeekplanError>,
{
    let (begin, commit, rollback) = if conn.is_autocommit() {
        ("BEGIN IMMEDIATE", "COMMIT", "ROLLBACK")
    } else {
        (
            "SAVEPOINT weekplan_nested",
            "RELEASE weekplan_nested",
            "ROLLBACK TO weekplan_nested; RELEASE weekplan_nested",
        )
    };

    conn.execute_batch(begin)?;
    match f() {
        Ok(value) => match conn.execute_batch(commit) {
            Ok(()) => Ok(value),
            Err(commit_err) => {
                // A failed COMMIT leaves the transaction open.
                tracing::warn!(error = %commit_err, "commit failed; rolling back");
                roll_back(conn, rollback);
                Err(commit_err.into())
            }
        },
        Err(e) => {
            roll_back(conn, rollback);
            Err(e)
        }
    }
}

fn roll_back(conn: &Connection, sql: &str) {
    if let Err(rollback_err) = conn.execute_batch(sql) {
        tracing::error!(error = %rollback_err, "rollback failed");
    }
}
