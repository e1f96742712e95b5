//! Shared types and constants for the Trailhead trip planner.
//!
//! This crate holds the vocabulary every other Trailhead crate agrees on:
//! the fixed role catalogue, the schema defaults the migrations encode, and
//! the tagged outcomes returned by mutating queries.
//!
//! Nothing here touches the database. Keeping these definitions in a leaf
//! crate lets `trailhead-db`, `trailhead-trips` and `trailhead-server` share
//! them without depending on each other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder photo assigned to users who do not supply one.
///
/// The `001_users` migration uses this exact value as the column default.
pub const DEFAULT_USER_PHOTO: &str =
    "https://s-media-cache-ak0.pinimg.com/originals/02/8c/43/028c43ed3eeab6c4a43181f517810501.jpg";

/// Role id assigned to users created without an explicit `role_id`.
pub const DEFAULT_ROLE_ID: i64 = RoleKind::Participant as i64;

/// The fixed set of roles a user can hold.
///
/// Ids are stable: they are written by the `000_roles` migration and
/// referenced by `users.role_id`, so the discriminants must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i64)]
pub enum RoleKind {
    /// Signs up for trips.
    #[default]
    Participant = 1,
    /// Runs trips.
    Leader = 2,
    /// Manages the platform.
    Admin = 3,
}

impl RoleKind {
    /// Every role, in id order. This is the canonical role dataset.
    pub const ALL: [RoleKind; 3] = [Self::Participant, Self::Leader, Self::Admin];

    /// Returns the primary key of this role in the `roles` table.
    pub fn id(self) -> i64 {
        self as i64
    }

    /// Looks up a role by its primary key.
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Participant),
            2 => Some(Self::Leader),
            3 => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the label stored in `roles.role`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Leader => "leader",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unrecognised role label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for RoleKind {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participant" => Ok(Self::Participant),
            "leader" => Ok(Self::Leader),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Result of an UPDATE addressed by primary key.
///
/// SQLite reports a missing row as zero affected rows rather than an error;
/// this type makes the caller handle that case explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOutcome {
    /// At least one row matched and was written.
    Updated,
    /// No row matched the key.
    NotFound,
}

impl UpdateOutcome {
    /// Builds an outcome from the affected-row count of an UPDATE.
    pub fn from_affected(rows: usize) -> Self {
        if rows == 0 {
            Self::NotFound
        } else {
            Self::Updated
        }
    }

    pub fn is_not_found(self) -> bool {
        self == Self::NotFound
    }
}

/// Result of a DELETE addressed by primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteOutcome {
    /// The row existed and was removed.
    Deleted,
    /// No row matched the key.
    NotFound,
}

impl DeleteOutcome {
    /// Builds an outcome from the affected-row count of a DELETE.
    pub fn from_affected(rows: usize) -> Self {
        if rows == 0 {
            Self::NotFound
        } else {
            Self::Deleted
        }
    }

    pub fn is_not_found(self) -> bool {
        self == Self::NotFound
    }
}
