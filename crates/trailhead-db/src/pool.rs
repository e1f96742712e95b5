//! The r2d2 pool of SQLite connections used by every Trailhead request.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Pool tunables, filled from the `[database]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Upper bound on open connections. Must be at least 1.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

/// Shared handle to the Trailhead database.
pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    /// r2d2 could not open the initial connections.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),

    /// `pool_max_size` was 0.
    #[error("database pool size must be at least 1")]
    EmptyPool,
}

/// Opens a pool over the SQLite file at `db_path`.
///
/// Each new connection goes through [`configure_connection`] before r2d2
/// hands it out. `:memory:` works but gives every connection its own empty
/// database, so it only suits single-connection tests.
///
/// # Errors
///
/// `PoolError::EmptyPool` for a zero `pool_max_size`; `PoolError::PoolInit`
/// if a connection cannot be opened or configured.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    if settings.pool_max_size == 0 {
        return Err(PoolError::EmptyPool);
    }

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_init(move |conn| configure_connection(conn, settings.busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        busy_timeout_ms = settings.busy_timeout_ms,
        "opened trailhead database pool"
    );
    Ok(pool)
}

/// Per-connection setup: WAL journaling, the busy timeout, and foreign keys.
///
/// SQLite turns foreign keys off by default on every connection. Without
/// them `users.role_id` and both `trips_users` references would accept
/// dangling ids and the delete cascades would not fire, so the pragma is
/// read back and a connection that did not take it is refused.
fn configure_connection(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    let journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    // In-memory databases cannot use WAL and report "memory".
    if journal_mode != "wal" && journal_mode != "memory" {
        return Err(setup_failure(format!(
            "journal_mode is {journal_mode}, expected wal"
        )));
    }

    conn.execute_batch(&format!(
        "PRAGMA busy_timeout = {busy_timeout_ms};
         PRAGMA foreign_keys = ON;"
    ))?;

    let foreign_keys: bool = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    if !foreign_keys {
        return Err(setup_failure("foreign key enforcement is unavailable".to_string()));
    }
    Ok(())
}

fn setup_failure(message: String) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(message),
    )
}
