//! Data access for the Trailhead trip planner.
//!
//! Implements CRUD over the four Trailhead tables: the static `roles`
//! catalogue, `users`, `trips`, and the `trips_users` signup join table.
//! Every function takes a borrowed `rusqlite::Connection` and issues
//! parameterized statements; pooling and async hand-off belong to the
//! caller.
//!
//! Mutations addressed by primary key never treat a missing row as an
//! error. They return [`UpdateOutcome`] or [`DeleteOutcome`] so the caller
//! must decide what "nothing matched" means.
//!
//! Two operations deliberately span several statements in one transaction:
//! [`seed_roles`] (the Seed Loader) and [`delete_role`], which removes the
//! role's users and their signups explicitly instead of leaving it to the
//! schema's `ON DELETE CASCADE`.

mod error;
mod roles;
mod signups;
mod sql;
mod trips;
mod users;

pub use error::StoreError;
pub use roles::{delete_role, get_role, list_roles, seed_roles, Role, RoleDeletion, SeedReport};
pub use signups::{
    count_signups, create_signup, delete_signup, get_signup, list_signups, update_signup,
    NewTripSignup, SignupFilter, SignupUpdate, TripSignup,
};
pub use trailhead_types::{DeleteOutcome, RoleKind, UpdateOutcome};
pub use trips::{create_trip, delete_trip, get_trip, list_trips, update_trip, NewTrip, Trip, TripUpdate};
pub use users::{
    create_user, delete_user, get_user, list_users, update_user, NewUser, User, UserUpdate,
};
