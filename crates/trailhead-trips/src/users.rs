//! Users: people who sign up for trips.

use crate::sql::{delete_by_id, insert_returning, update_by_id, Assignments};
use crate::StoreError;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use trailhead_types::{DeleteOutcome, UpdateOutcome};

const USER_COLUMNS: &str = "id, first_name, last_name, photo, email, role_id, \
     phone, street_address, city, state, zipcode, created_at, updated_at";

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Photo URL. Defaults to the placeholder when not supplied.
    pub photo: String,
    pub email: String,
    /// References `roles.id`. Defaults to `participant`.
    pub role_id: i64,
    pub phone: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    /// Insert timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub created_at: String,
    /// Last modification timestamp, maintained by a schema trigger.
    pub updated_at: String,
}

/// Fields for a new user. `None` fields take their schema defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub photo: Option<String>,
    pub role_id: Option<i64>,
    pub phone: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
}

/// A partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub role_id: Option<i64>,
    pub phone: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
}

/// Lists all users ordered by id.
pub fn list_users(conn: &Connection) -> Result<Vec<User>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users ORDER BY id ASC",
        USER_COLUMNS
    ))?;

    let rows = stmt.query_map([], map_row_to_user)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

/// Retrieves a user by id.
pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            [id],
            map_row_to_user,
        )
        .optional()?;
    Ok(user)
}

/// Creates a user and returns the stored row.
///
/// # Errors
///
/// Returns `StoreError::InvalidReference` if `role_id` names no role.
pub fn create_user(conn: &Connection, new: &NewUser) -> Result<User, StoreError> {
    let mut values = Assignments::new();
    values.set("first_name", new.first_name.clone());
    values.set("last_name", new.last_name.clone());
    values.set("email", new.email.clone());
    values.set_opt("photo", new.photo.clone());
    values.set_opt("role_id", new.role_id);
    values.set_opt("phone", new.phone.clone());
    values.set_opt("street_address", new.street_address.clone());
    values.set_opt("city", new.city.clone());
    values.set_opt("state", new.state.clone());
    values.set_opt("zipcode", new.zipcode.clone());

    let user = insert_returning(conn, "users", USER_COLUMNS, &values, map_row_to_user)?;
    tracing::debug!(user_id = user.id, role_id = user.role_id, "created user");
    Ok(user)
}

/// Applies a partial update to the user with the given id.
pub fn update_user(
    conn: &Connection,
    id: i64,
    update: &UserUpdate,
) -> Result<UpdateOutcome, StoreError> {
    let mut values = Assignments::new();
    values.set_opt("first_name", update.first_name.clone());
    values.set_opt("last_name", update.last_name.clone());
    values.set_opt("email", update.email.clone());
    values.set_opt("photo", update.photo.clone());
    values.set_opt("role_id", update.role_id);
    values.set_opt("phone", update.phone.clone());
    values.set_opt("street_address", update.street_address.clone());
    values.set_opt("city", update.city.clone());
    values.set_opt("state", update.state.clone());
    values.set_opt("zipcode", update.zipcode.clone());

    let count = update_by_id(conn, "users", id, &values)?;
    Ok(UpdateOutcome::from_affected(count))
}

/// Deletes a user. Their trip signups go with them (`ON DELETE CASCADE`).
pub fn delete_user(conn: &Connection, id: i64) -> Result<DeleteOutcome, StoreError> {
    let count = delete_by_id(conn, "users", id)?;
    Ok(DeleteOutcome::from_affected(count))
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        photo: row.get(3)?,
        email: row.get(4)?,
        role_id: row.get(5)?,
        phone: row.get(6)?,
        street_address: row.get(7)?,
        city: row.get(8)?,
        state: row.get(9)?,
        zipcode: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
