//! The role catalogue and the Seed Loader.
//!
//! Roles are reference data: the `000_roles` migration ships the canonical
//! dataset and nothing in the HTTP surface mutates it. Two maintenance
//! operations live here, both transactional:
//!
//! - [`seed_roles`] restores the canonical dataset without deleting any
//!   canonical row, so users holding those roles are untouched.
//! - [`delete_role`] removes a role together with every user holding it
//!   (and their signups), performing the cascade explicitly.

use crate::StoreError;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};
use trailhead_types::RoleKind;

/// A row of the `roles` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: i64,
    pub role: String,
}

impl Role {
    /// Returns the matching canonical role, if this row is one.
    pub fn kind(&self) -> Option<RoleKind> {
        RoleKind::from_id(self.id).filter(|kind| kind.label() == self.role)
    }
}

/// What [`seed_roles`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Canonical rows inserted or rewritten.
    pub upserted: usize,
    /// Non-canonical role rows removed.
    pub roles_removed: usize,
    /// Users removed because they held a non-canonical role.
    pub users_removed: usize,
}

/// Result of [`delete_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoleDeletion {
    /// The role existed and was removed together with its users.
    Deleted { users_removed: usize },
    /// No role has this id. Nothing was changed.
    NotFound,
}

/// Lists all roles ordered by id.
pub fn list_roles(conn: &Connection) -> Result<Vec<Role>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, role FROM roles ORDER BY id ASC")?;

    let rows = stmt.query_map([], map_row_to_role)?;
    let mut roles = Vec::new();
    for row in rows {
        roles.push(row?);
    }
    Ok(roles)
}

/// Retrieves a role by id.
pub fn get_role(conn: &Connection, id: i64) -> Result<Option<Role>, StoreError> {
    let role = conn
        .query_row("SELECT id, role FROM roles WHERE id = ?1", [id], map_row_to_role)
        .optional()?;
    Ok(role)
}

/// Restores the `roles` table to exactly [`RoleKind::ALL`].
///
/// Runs in one transaction: rows outside the dataset are removed (with
/// their users, see [`delete_role`]), then every canonical row is upserted
/// by its fixed id. Running it again yields the same table.
pub fn seed_roles(conn: &mut Connection) -> Result<SeedReport, StoreError> {
    let tx = conn.transaction()?;
    let mut report = SeedReport::default();

    let stale: Vec<i64> = {
        let mut stmt = tx.prepare("SELECT id FROM roles ORDER BY id ASC")?;
        let ids = stmt.query_map([], |row| row.get(0))?;
        let mut stale = Vec::new();
        for id in ids {
            let id: i64 = id?;
            if RoleKind::from_id(id).is_none() {
                stale.push(id);
            }
        }
        stale
    };

    for id in stale {
        report.users_removed += cascade_delete_role(&tx, id)?;
        report.roles_removed += 1;
    }

    for kind in RoleKind::ALL {
        report.upserted += tx.execute(
            "INSERT INTO roles (id, role) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET role = excluded.role",
            params![kind.id(), kind.label()],
        )?;
    }

    tx.commit()?;

    tracing::info!(
        upserted = report.upserted,
        roles_removed = report.roles_removed,
        users_removed = report.users_removed,
        "seeded roles"
    );
    Ok(report)
}

/// Deletes a role and, explicitly, every user holding it.
///
/// Signups of those users are removed first, then the users, then the role,
/// all in one transaction.
pub fn delete_role(conn: &mut Connection, id: i64) -> Result<RoleDeletion, StoreError> {
    let tx = conn.transaction()?;

    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM roles WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(RoleDeletion::NotFound);
    }

    let users_removed = cascade_delete_role(&tx, id)?;
    tx.commit()?;

    tracing::warn!(role_id = id, users_removed, "deleted role and its users");
    Ok(RoleDeletion::Deleted { users_removed })
}

/// Removes a role's dependents and then the role. Returns the users removed.
fn cascade_delete_role(tx: &Transaction, id: i64) -> Result<usize, StoreError> {
    tx.execute(
        "DELETE FROM trips_users
         WHERE user_id IN (SELECT id FROM users WHERE role_id = ?1)",
        [id],
    )?;
    let users_removed = tx.execute("DELETE FROM users WHERE role_id = ?1", [id])?;
    tx.execute("DELETE FROM roles WHERE id = ?1", [id])?;
    Ok(users_removed)
}

fn map_row_to_role(row: &Row) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get(0)?,
        role: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_conn;
    use crate::{create_signup, create_trip, create_user, list_signups, list_users};
    use crate::{NewTrip, NewTripSignup, NewUser, SignupFilter};

    fn canonical() -> Vec<Role> {
        RoleKind::ALL
            .iter()
            .map(|kind| Role {
                id: kind.id(),
                role: kind.label().to_string(),
            })
            .collect()
    }

    fn user_with_role(conn: &Connection, name: &str, role_id: i64) -> i64 {
        create_user(
            conn,
            &NewUser {
                first_name: name.to_string(),
                last_name: "Hiker".to_string(),
                email: format!("{name}@example.com"),
                role_id: Some(role_id),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn migrated_roles_are_canonical() {
        let conn = migrated_conn();
        let roles = list_roles(&conn).unwrap();
        assert_eq!(roles, canonical());
        assert!(roles.iter().all(|r| r.kind().is_some()));
        assert_eq!(get_role(&conn, 4).unwrap(), None);
    }

    #[test]
    fn seed_restores_canonical_set_from_any_state() {
        let mut conn = migrated_conn();
        conn.execute_batch(
            "DELETE FROM roles WHERE id = 3;
             UPDATE roles SET role = 'guide' WHERE id = 2;
             INSERT INTO roles (id, role) VALUES (7, 'sherpa');",
        )
        .unwrap();

        let report = seed_roles(&mut conn).unwrap();
        assert_eq!(report.upserted, 3);
        assert_eq!(report.roles_removed, 1);
        assert_eq!(list_roles(&conn).unwrap(), canonical());

        // Same end state on a second run.
        let again = seed_roles(&mut conn).unwrap();
        assert_eq!(again.roles_removed, 0);
        assert_eq!(list_roles(&conn).unwrap(), canonical());
    }

    #[test]
    fn seed_keeps_users_of_canonical_roles() {
        let mut conn = migrated_conn();
        user_with_role(&conn, "leader", RoleKind::Leader.id());
        conn.execute("INSERT INTO roles (id, role) VALUES (9, 'temp')", [])
            .unwrap();
        user_with_role(&conn, "temp", 9);

        let report = seed_roles(&mut conn).unwrap();
        assert_eq!(report.users_removed, 1);

        let users = list_users(&conn).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].first_name, "leader");
    }

    #[test]
    fn delete_role_removes_its_users_and_their_signups() {
        let mut conn = migrated_conn();
        let leader_a = user_with_role(&conn, "a", 2);
        user_with_role(&conn, "b", 2);
        let participant = user_with_role(&conn, "c", 1);

        let trip = create_trip(
            &conn,
            &NewTrip {
                name: "Vestal Peak".to_string(),
                dates: "5/14/17 - 5/22/17".to_string(),
                cost: "$1,000,000".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        for user_id in [leader_a, participant] {
            create_signup(
                &conn,
                &NewTripSignup {
                    trip_id: trip.id,
                    user_id,
                    stripe_id: "ajbjsdse".to_string(),
                },
            )
            .unwrap();
        }

        let outcome = delete_role(&mut conn, 2).unwrap();
        assert_eq!(outcome, RoleDeletion::Deleted { users_removed: 2 });

        let users = list_users(&conn).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, participant);

        let signups = list_signups(&conn, SignupFilter::default()).unwrap();
        assert_eq!(signups.len(), 1);
        assert_eq!(signups[0].user_id, participant);

        assert_eq!(get_role(&conn, 2).unwrap(), None);
    }

    #[test]
    fn delete_missing_role_changes_nothing() {
        let mut conn = migrated_conn();
        user_with_role(&conn, "a", 1);

        assert_eq!(delete_role(&mut conn, 42).unwrap(), RoleDeletion::NotFound);
        assert_eq!(list_roles(&conn).unwrap().len(), 3);
        assert_eq!(list_users(&conn).unwrap().len(), 1);
    }
}
