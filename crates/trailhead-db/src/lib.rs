//! Database layer for the Trailhead trip planner.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and the embedded, reversible schema migrations. Every table Trailhead
//! reads or writes (`roles`, `users`, `trips`, `trips_users`) is created
//! through a versioned migration managed by this crate, including the fixed
//! role dataset.

mod migrations;
mod pool;

pub use migrations::{applied_migrations, revert_migrations, run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};

use thiserror::Error;

/// Errors that can occur while bringing a database up to date.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to get database connection: {0}")]
    Connection(#[from] r2d2::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Creates a pool for `db_path` and applies every pending migration.
///
/// This is the single entry point the server uses at startup.
///
/// # Errors
///
/// Returns `InitError` if the pool cannot be built, no connection can be
/// checked out, or a migration fails.
pub fn open_database(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, InitError> {
    let pool = create_pool(db_path, settings)?;

    {
        let conn = pool.get()?;
        let applied = run_migrations(&conn)?;
        if applied > 0 {
            tracing::info!(count = applied, path = db_path, "applied database migrations");
        }
    }

    Ok(pool)
}
