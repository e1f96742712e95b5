//! Error type for data access operations.

use rusqlite::ffi::{ErrorCode, SQLITE_CONSTRAINT_FOREIGNKEY};
use thiserror::Error;

/// Errors that can occur during Trailhead data access.
///
/// A row that does not exist is not an error here; see
/// [`UpdateOutcome`](crate::UpdateOutcome) and
/// [`DeleteOutcome`](crate::DeleteOutcome).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced row (role, trip or user) does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Any other constraint violation, e.g. a missing required column.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Connectivity or any other storage failure. Never retried.
    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, msg) = &e {
            let detail = msg.clone().unwrap_or_else(|| err.to_string());
            if err.extended_code == SQLITE_CONSTRAINT_FOREIGNKEY {
                return StoreError::InvalidReference(detail);
            }
            if err.code == ErrorCode::ConstraintViolation {
                return StoreError::Constraint(detail);
            }
        }
        StoreError::Database(e)
    }
}
