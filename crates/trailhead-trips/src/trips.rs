//! Trips offered on the platform.
//!
//! `numberOfPeople` is an ordinary column. Creating or deleting a signup
//! never changes it; use [`count_signups`](crate::count_signups) for the
//! number of signups actually recorded.

use crate::sql::{delete_by_id, insert_returning, update_by_id, Assignments};
use crate::StoreError;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use trailhead_types::{DeleteOutcome, UpdateOutcome};

const TRIP_COLUMNS: &str = "id, name, photo, description, dates, cost, numberOfPeople";

/// A trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: i64,
    pub name: String,
    pub photo: Option<String>,
    pub description: Option<String>,
    /// Free-text date range, e.g. `4/14/17 - 4/22/17`.
    pub dates: String,
    /// Free-text price, e.g. `$1,000,000`.
    pub cost: String,
    #[serde(rename = "numberOfPeople")]
    pub number_of_people: i64,
}

/// Fields for a new trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTrip {
    pub name: String,
    pub photo: Option<String>,
    pub description: Option<String>,
    pub dates: String,
    pub cost: String,
    /// Defaults to 0.
    #[serde(rename = "numberOfPeople")]
    pub number_of_people: Option<i64>,
}

/// A partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripUpdate {
    pub name: Option<String>,
    pub photo: Option<String>,
    pub description: Option<String>,
    pub dates: Option<String>,
    pub cost: Option<String>,
    #[serde(rename = "numberOfPeople")]
    pub number_of_people: Option<i64>,
}

/// Lists all trips ordered by id.
pub fn list_trips(conn: &Connection) -> Result<Vec<Trip>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM trips ORDER BY id ASC",
        TRIP_COLUMNS
    ))?;

    let rows = stmt.query_map([], map_row_to_trip)?;
    let mut trips = Vec::new();
    for row in rows {
        trips.push(row?);
    }
    Ok(trips)
}

/// Retrieves a trip by id.
pub fn get_trip(conn: &Connection, id: i64) -> Result<Option<Trip>, StoreError> {
    let trip = conn
        .query_row(
            &format!("SELECT {} FROM trips WHERE id = ?1", TRIP_COLUMNS),
            [id],
            map_row_to_trip,
        )
        .optional()?;
    Ok(trip)
}

/// Creates a trip and returns the stored row.
pub fn create_trip(conn: &Connection, new: &NewTrip) -> Result<Trip, StoreError> {
    let mut values = Assignments::new();
    values.set("name", new.name.clone());
    values.set_opt("photo", new.photo.clone());
    values.set_opt("description", new.description.clone());
    values.set("dates", new.dates.clone());
    values.set("cost", new.cost.clone());
    values.set_opt("numberOfPeople", new.number_of_people);

    let trip = insert_returning(conn, "trips", TRIP_COLUMNS, &values, map_row_to_trip)?;
    tracing::debug!(trip_id = trip.id, "created trip");
    Ok(trip)
}

/// Applies a partial update to the trip with the given id in one statement.
pub fn update_trip(
    conn: &Connection,
    id: i64,
    update: &TripUpdate,
) -> Result<UpdateOutcome, StoreError> {
    let mut values = Assignments::new();
    values.set_opt("name", update.name.clone());
    values.set_opt("photo", update.photo.clone());
    values.set_opt("description", update.description.clone());
    values.set_opt("dates", update.dates.clone());
    values.set_opt("cost", update.cost.clone());
    values.set_opt("numberOfPeople", update.number_of_people);

    let count = update_by_id(conn, "trips", id, &values)?;
    Ok(UpdateOutcome::from_affected(count))
}

/// Deletes a trip. Its signups go with it (`ON DELETE CASCADE`).
pub fn delete_trip(conn: &Connection, id: i64) -> Result<DeleteOutcome, StoreError> {
    let count = delete_by_id(conn, "trips", id)?;
    Ok(DeleteOutcome::from_affected(count))
}

fn map_row_to_trip(row: &Row) -> rusqlite::Result<Trip> {
    Ok(Trip {
        id: row.get(0)?,
        name: row.get(1)?,
        photo: row.get(2)?,
        description: row.get(3)?,
        dates: row.get(4)?,
        cost: row.get(5)?,
        number_of_people: row.get(6)?,
    })
}
