//! Statement builders shared by the table modules.
//!
//! Inserts and partial updates only name the columns the caller supplied,
//! so omitted columns keep their schema defaults (on insert) or their
//! current values (on update) and the whole change is one statement.

use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};

/// Column/value pairs collected for a single INSERT or UPDATE.
#[derive(Default)]
pub(crate) struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl Assignments {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `column = value`.
    pub(crate) fn set<T: ToSql + 'static>(&mut self, column: &'static str, value: T) {
        self.columns.push(column);
        self.values.push(Box::new(value));
    }

    /// Adds `column = value` only when a value was supplied.
    pub(crate) fn set_opt<T: ToSql + 'static>(&mut self, column: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.set(column, value);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn params(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|v| v.as_ref()).collect()
    }
}

/// Runs `INSERT ... RETURNING` and maps the inserted row.
pub(crate) fn insert_returning<T>(
    conn: &Connection,
    table: &str,
    returning: &str,
    assignments: &Assignments,
    map: impl FnOnce(&Row) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
    let placeholders: Vec<String> = (1..=assignments.columns.len())
        .map(|i| format!("?{}", i))
        .collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        assignments.columns.join(", "),
        placeholders.join(", "),
        returning
    );

    conn.query_row(&sql, assignments.params().as_slice(), map)
}

/// Runs `UPDATE table SET ... WHERE id = ?` and returns the affected-row count.
///
/// An empty assignment set writes nothing and instead reports whether the
/// row exists (1 or 0), so callers get the same not-found signal either way.
pub(crate) fn update_by_id(
    conn: &Connection,
    table: &str,
    id: i64,
    assignments: &Assignments,
) -> rusqlite::Result<usize> {
    if assignments.is_empty() {
        let exists: bool = conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
            [id],
            |row| row.get(0),
        )?;
        return Ok(usize::from(exists));
    }

    let set_parts: Vec<String> = assignments
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", column, i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        table,
        set_parts.join(", "),
        assignments.columns.len() + 1
    );

    let mut params = assignments.params();
    params.push(&id);
    conn.execute(&sql, params.as_slice())
}

/// Runs `DELETE FROM table WHERE id = ?` and returns the affected-row count.
pub(crate) fn delete_by_id(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<usize> {
    conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table), [id])
}
