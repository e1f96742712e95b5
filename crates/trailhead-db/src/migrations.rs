//! Embedded, reversible SQL migrations.
//!
//! Each migration is a pair of SQL scripts embedded at compile time: `up`
//! moves the schema forward, `down` undoes exactly what `up` did. Applied
//! migrations are tracked by name in the `_trailhead_migrations` table, so
//! `run_migrations` applies each `up` at most once per database and
//! `revert_migrations` only reverts what has actually been applied.
//!
//! `down` scripts are deliberately plain (`DROP TABLE users;`, not
//! `DROP TABLE IF EXISTS`). Running one against a schema it does not match
//! fails loudly instead of silently succeeding.

use rusqlite::Connection;
use thiserror::Error;

/// A single embedded migration.
pub(crate) struct Migration {
    name: &'static str,
    up: &'static str,
    down: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "000_roles",
        up: include_str!("migrations/000_roles.up.sql"),
        down: include_str!("migrations/000_roles.down.sql"),
    },
    Migration {
        name: "001_users",
        up: include_str!("migrations/001_users.up.sql"),
        down: include_str!("migrations/001_users.down.sql"),
    },
    Migration {
        name: "002_trips",
        up: include_str!("migrations/002_trips.up.sql"),
        down: include_str!("migrations/002_trips.down.sql"),
    },
    Migration {
        name: "003_trips_users",
        up: include_str!("migrations/003_trips_users.up.sql"),
        down: include_str!("migrations/003_trips_users.down.sql"),
    },
    Migration {
        name: "004_user_contact",
        up: include_str!("migrations/004_user_contact.up.sql"),
        down: include_str!("migrations/004_user_contact.down.sql"),
    },
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),

    /// An applied migration is not part of this build.
    #[error("applied migration '{0}' is unknown to this build")]
    Unknown(String),
}

/// Direction a migration is run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Runs all pending migrations against the given connection.
///
/// Migrations that have already been applied (tracked in
/// `_trailhead_migrations`) are skipped. New migrations are applied in order
/// and recorded. Returns the number of migrations applied.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

/// Reverts the `steps` most recently applied migrations, newest first.
///
/// Returns the number of migrations reverted, which is less than `steps`
/// when fewer migrations are applied.
///
/// # Errors
///
/// Returns `MigrationError` if a `down` script fails or if an applied
/// migration has no counterpart in this build.
pub fn revert_migrations(conn: &Connection, steps: usize) -> Result<usize, MigrationError> {
    revert_migrations_from_list(conn, MIGRATIONS, steps)
}

/// Lists the names of applied migrations, oldest first.
///
/// # Errors
///
/// Returns `MigrationError::StateQuery` if the tracking table cannot be read.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>, MigrationError> {
    ensure_tracking_table(conn)?;

    let mut stmt = conn
        .prepare("SELECT name FROM _trailhead_migrations ORDER BY id ASC")
        .map_err(MigrationError::StateQuery)?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(MigrationError::StateQuery)?;

    let mut names = Vec::new();
    for row in rows {
        names.push(row.map_err(MigrationError::StateQuery)?);
    }
    Ok(names)
}

fn ensure_tracking_table(conn: &Connection) -> Result<(), MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _trailhead_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| MigrationError::ExecutionFailed {
        name: "_trailhead_migrations_bootstrap".to_string(),
        source: e,
    })
}

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    ensure_tracking_table(conn)?;

    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _trailhead_migrations WHERE name = ?1",
                [migration.name],
                |row| row.get(0),
            )
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");
        apply(conn, migration, Direction::Up)?;
        applied += 1;
    }

    Ok(applied)
}

fn revert_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
    steps: usize,
) -> Result<usize, MigrationError> {
    let applied = applied_migrations(conn)?;
    let mut reverted = 0;

    for name in applied.iter().rev().take(steps) {
        let migration = migrations
            .iter()
            .find(|m| m.name == name.as_str())
            .ok_or_else(|| MigrationError::Unknown(name.clone()))?;

        tracing::info!(migration = migration.name, "reverting migration");
        apply(conn, migration, Direction::Down)?;
        reverted += 1;
    }

    Ok(reverted)
}

/// Runs one migration script and its tracking change in a single transaction.
fn apply(conn: &Connection, migration: &Migration, direction: Direction) -> Result<(), MigrationError> {
    let failed = |e| MigrationError::ExecutionFailed {
        name: migration.name.to_string(),
        source: e,
    };

    let tx = conn.unchecked_transaction().map_err(failed)?;

    match direction {
        Direction::Up => {
            tx.execute_batch(migration.up).map_err(failed)?;
            tx.execute(
                "INSERT INTO _trailhead_migrations (name) VALUES (?1)",
                [migration.name],
            )
            .map_err(failed)?;
        }
        Direction::Down => {
            tx.execute_batch(migration.down).map_err(failed)?;
            tx.execute(
                "DELETE FROM _trailhead_migrations WHERE name = ?1",
                [migration.name],
            )
            .map_err(failed)?;
        }
    }

    tx.commit().map_err(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .expect("should enable foreign keys");
        conn
    }

    fn table_exists(conn: &Connection, table: &str) -> bool {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table],
            |row| row.get(0),
        )
        .expect("should query sqlite_master")
    }

    #[test]
    fn run_migrations_on_fresh_db() {
        let conn = open();
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, MIGRATIONS.len());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM _trailhead_migrations", [], |row| {
                row.get(0)
            })
            .expect("should query migration count");
        assert_eq!(count, MIGRATIONS.len() as i64);

        for table in ["roles", "users", "trips", "trips_users"] {
            assert!(table_exists(&conn, table), "{table} table should exist");
        }
    }

    #[test]
    fn run_migrations_idempotent() {
        let conn = open();

        let first = run_migrations(&conn).expect("first run should succeed");
        assert_eq!(first, MIGRATIONS.len());

        let second = run_migrations(&conn).expect("second run should succeed");
        assert_eq!(second, 0, "no new migrations to apply");
    }

    #[test]
    fn role_dataset_ships_with_schema() {
        let conn = open();
        run_migrations(&conn).expect("migrations should succeed");

        let mut stmt = conn
            .prepare("SELECT id, role FROM roles ORDER BY id")
            .unwrap();
        let rows: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        let expected: Vec<(i64, String)> = trailhead_types::RoleKind::ALL
            .iter()
            .map(|r| (r.id(), r.label().to_string()))
            .collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn user_defaults_come_from_schema() {
        let conn = open();
        run_migrations(&conn).expect("migrations should succeed");

        conn.execute(
            "INSERT INTO users (first_name, last_name, email) VALUES ('Ada', 'Hike', 'ada@example.com')",
            [],
        )
        .unwrap();

        let (photo, role_id, created_at, updated_at): (String, i64, String, String) = conn
            .query_row(
                "SELECT photo, role_id, created_at, updated_at FROM users",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(photo, trailhead_types::DEFAULT_USER_PHOTO);
        assert_eq!(role_id, trailhead_types::DEFAULT_ROLE_ID);
        assert!(!created_at.is_empty());
        assert!(!updated_at.is_empty());
    }

    #[test]
    fn updated_at_refreshes_on_update() {
        let conn = open();
        run_migrations(&conn).expect("migrations should succeed");

        conn.execute(
            "INSERT INTO users (first_name, last_name, email, created_at, updated_at)
             VALUES ('Ada', 'Hike', 'ada@example.com', '2000-01-01 00:00:00', '2000-01-01 00:00:00')",
            [],
        )
        .unwrap();
        conn.execute("UPDATE users SET last_name = 'Climb'", []).unwrap();

        let (created_at, updated_at): (String, String) = conn
            .query_row("SELECT created_at, updated_at FROM users", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(created_at, "2000-01-01 00:00:00");
        assert_ne!(updated_at, "2000-01-01 00:00:00");
    }

    #[test]
    fn deleting_role_cascades_to_users() {
        let conn = open();
        run_migrations(&conn).expect("migrations should succeed");

        conn.execute_batch(
            "INSERT INTO users (first_name, last_name, email, role_id) VALUES ('A', 'A', 'a@x', 2);
             INSERT INTO users (first_name, last_name, email, role_id) VALUES ('B', 'B', 'b@x', 2);
             INSERT INTO users (first_name, last_name, email, role_id) VALUES ('C', 'C', 'c@x', 1);",
        )
        .unwrap();
        conn.execute("DELETE FROM roles WHERE id = 2", []).unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn signup_requires_existing_trip_and_user() {
        let conn = open();
        run_migrations(&conn).expect("migrations should succeed");

        let err = conn
            .execute(
                "INSERT INTO trips_users (trip_id, user_id, stripe_id) VALUES (99, 99, 'ch_1')",
                [],
            )
            .expect_err("dangling signup should be rejected");
        assert!(err.to_string().contains("FOREIGN KEY"), "unexpected error: {err}");
    }

    #[test]
    fn revert_walks_back_newest_first() {
        let conn = open();
        run_migrations(&conn).expect("migrations should succeed");

        let reverted = revert_migrations(&conn, 2).expect("revert should succeed");
        assert_eq!(reverted, 2);
        assert!(!table_exists(&conn, "trips_users"));
        assert!(table_exists(&conn, "trips"));

        let names = applied_migrations(&conn).unwrap();
        assert_eq!(names, vec!["000_roles", "001_users", "002_trips"]);

        // Re-applying only brings back what was reverted.
        let applied = run_migrations(&conn).expect("reapply should succeed");
        assert_eq!(applied, 2);
        assert!(table_exists(&conn, "trips_users"));
    }

    #[test]
    fn revert_everything_leaves_only_tracking_table() {
        let conn = open();
        run_migrations(&conn).expect("migrations should succeed");

        let reverted = revert_migrations(&conn, usize::MAX).expect("revert should succeed");
        assert_eq!(reverted, MIGRATIONS.len());
        assert_eq!(revert_migrations(&conn, 1).unwrap(), 0);

        for table in ["roles", "users", "trips", "trips_users"] {
            assert!(!table_exists(&conn, table), "{table} should be dropped");
        }
    }

    #[test]
    fn users_down_script_is_not_idempotent() {
        let conn = open();
        run_migrations(&conn).expect("migrations should succeed");
        conn.execute_batch("DROP TABLE trips_users;").unwrap();

        let users = MIGRATIONS
            .iter()
            .find(|m| m.name == "001_users")
            .expect("users migration should exist");
        conn.execute_batch(users.down).expect("first drop should succeed");

        let err = conn
            .execute_batch(users.down)
            .expect_err("second drop should fail");
        assert!(err.to_string().contains("no such table"), "unexpected error: {err}");
    }

    #[test]
    fn migration_side_effects_rollback_when_tracking_insert_fails() {
        let conn = open();
        let migrations = [Migration {
            name: "001_tracking_insert_conflict",
            up: "
                CREATE TABLE rollback_probe (id INTEGER PRIMARY KEY);
                INSERT INTO _trailhead_migrations (name) VALUES ('001_tracking_insert_conflict');
            ",
            down: "DROP TABLE rollback_probe;",
        }];

        let err = run_migrations_from_list(&conn, &migrations)
            .expect_err("tracking insert conflict should fail migration");

        match err {
            MigrationError::ExecutionFailed { name, .. } => {
                assert_eq!(name, "001_tracking_insert_conflict")
            }
            other => panic!("unexpected error type: {other:?}"),
        }

        assert!(
            !table_exists(&conn, "rollback_probe"),
            "schema side effects should be rolled back when tracking insert fails"
        );
    }

    #[test]
    fn failed_down_keeps_tracking_row() {
        let conn = open();
        let migrations = [Migration {
            name: "000_probe",
            up: "CREATE TABLE probe (id INTEGER PRIMARY KEY);",
            down: "DROP TABLE probe_typo;",
        }];
        run_migrations_from_list(&conn, &migrations).unwrap();

        revert_migrations_from_list(&conn, &migrations, 1)
            .expect_err("broken down script should fail");

        assert_eq!(applied_migrations(&conn).unwrap(), vec!["000_probe"]);
        assert!(table_exists(&conn, "probe"));
    }

    #[test]
    fn revert_rejects_unknown_migration() {
        let conn = open();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO _trailhead_migrations (name) VALUES ('999_from_the_future')",
            [],
        )
        .unwrap();

        match revert_migrations(&conn, 1) {
            Err(MigrationError::Unknown(name)) => assert_eq!(name, "999_from_the_future"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
