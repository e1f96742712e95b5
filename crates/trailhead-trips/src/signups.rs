//! Trip signups: the `trips_users` join table plus payment reference.

use crate::sql::{delete_by_id, insert_returning, update_by_id, Assignments};
use crate::StoreError;
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use trailhead_types::{DeleteOutcome, UpdateOutcome};

const SIGNUP_COLUMNS: &str = "id, trip_id, user_id, stripe_id";

/// A user's signup for a trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripSignup {
    pub id: i64,
    pub trip_id: i64,
    pub user_id: i64,
    /// Payment reference from the card processor.
    pub stripe_id: String,
}

/// Fields for a new signup. Both the trip and the user must exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTripSignup {
    pub trip_id: i64,
    pub user_id: i64,
    pub stripe_id: String,
}

/// A partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupUpdate {
    pub stripe_id: Option<String>,
}

/// Optional filters for [`list_signups`]. Empty means all signups.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SignupFilter {
    pub trip_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Lists signups matching `filter`, ordered by id.
pub fn list_signups(
    conn: &Connection,
    filter: SignupFilter,
) -> Result<Vec<TripSignup>, StoreError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    if let Some(trip_id) = &filter.trip_id {
        values.push(trip_id);
        conditions.push(format!("trip_id = ?{}", values.len()));
    }
    if let Some(user_id) = &filter.user_id {
        values.push(user_id);
        conditions.push(format!("user_id = ?{}", values.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM trips_users{} ORDER BY id ASC",
        SIGNUP_COLUMNS, where_clause
    ))?;

    let rows = stmt.query_map(values.as_slice(), map_row_to_signup)?;
    let mut signups = Vec::new();
    for row in rows {
        signups.push(row?);
    }
    Ok(signups)
}

/// Retrieves a signup by id.
pub fn get_signup(conn: &Connection, id: i64) -> Result<Option<TripSignup>, StoreError> {
    let signup = conn
        .query_row(
            &format!("SELECT {} FROM trips_users WHERE id = ?1", SIGNUP_COLUMNS),
            [id],
            map_row_to_signup,
        )
        .optional()?;
    Ok(signup)
}

/// Records a signup.
///
/// The trip's `numberOfPeople` is left as is.
///
/// # Errors
///
/// Returns `StoreError::InvalidReference` if the trip or the user does not exist.
pub fn create_signup(conn: &Connection, new: &NewTripSignup) -> Result<TripSignup, StoreError> {
    let mut values = Assignments::new();
    values.set("trip_id", new.trip_id);
    values.set("user_id", new.user_id);
    values.set("stripe_id", new.stripe_id.clone());

    let signup = insert_returning(conn, "trips_users", SIGNUP_COLUMNS, &values, map_row_to_signup)?;
    tracing::debug!(
        signup_id = signup.id,
        trip_id = signup.trip_id,
        user_id = signup.user_id,
        "created trip signup"
    );
    Ok(signup)
}

/// Applies a partial update to the signup with the given id.
pub fn update_signup(
    conn: &Connection,
    id: i64,
    update: &SignupUpdate,
) -> Result<UpdateOutcome, StoreError> {
    let mut values = Assignments::new();
    values.set_opt("stripe_id", update.stripe_id.clone());

    let count = update_by_id(conn, "trips_users", id, &values)?;
    Ok(UpdateOutcome::from_affected(count))
}

/// Deletes a signup.
pub fn delete_signup(conn: &Connection, id: i64) -> Result<DeleteOutcome, StoreError> {
    let count = delete_by_id(conn, "trips_users", id)?;
    Ok(DeleteOutcome::from_affected(count))
}

/// Counts the signups recorded for a trip.
pub fn count_signups(conn: &Connection, trip_id: i64) -> Result<i64, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM trips_users WHERE trip_id = ?1",
        [trip_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn map_row_to_signup(row: &Row) -> rusqlite::Result<TripSignup> {
    Ok(TripSignup {
        id: row.get(0)?,
        trip_id: row.get(1)?,
        user_id: row.get(2)?,
        stripe_id: row.get(3)?,
    })
}
