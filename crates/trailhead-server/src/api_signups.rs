//! Trip signup (`trips_users`) and role API handlers.

use crate::api::{not_found, submission_response, with_conn, ApiError, Submission};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use trailhead_trips::{
    create_signup, delete_signup, get_signup, list_roles, list_signups, update_signup,
    DeleteOutcome, NewTripSignup, Role, SignupFilter, SignupUpdate, TripSignup, UpdateOutcome,
};

/// Handler for `GET /trips_users`.
///
/// Accepts optional `trip_id` and `user_id` query filters.
pub async fn list_signups_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(filter): Query<SignupFilter>,
) -> Result<Json<Vec<TripSignup>>, ApiError> {
    let signups =
        with_conn(&state, "list_signups", move |conn| Ok(list_signups(conn, filter)?)).await?;
    Ok(Json(signups))
}

/// Handler for `GET /trips_users/{id}`.
pub async fn get_signup_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TripSignup>, ApiError> {
    let signup = with_conn(&state, "get_signup", move |conn| Ok(get_signup(conn, id)?)).await?;
    signup.map(Json).ok_or_else(|| not_found("signup", id))
}

/// Handler for `POST /trips_users`.
///
/// Both the trip and the user must exist (422 otherwise). The trip's
/// `numberOfPeople` is not changed.
pub async fn create_signup_handler(
    Extension(state): Extension<Arc<AppState>>,
    submission: Submission<NewTripSignup>,
) -> Result<Response, ApiError> {
    let new = submission.body;
    let signup =
        with_conn(&state, "create_signup", move |conn| Ok(create_signup(conn, &new)?)).await?;

    tracing::info!(
        signup_id = signup.id,
        trip_id = signup.trip_id,
        user_id = signup.user_id,
        "trip signup created"
    );
    Ok(submission_response(submission.kind, "/trips_users", signup))
}

/// Handler for `PUT /trips_users/{id}`.
pub async fn update_signup_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    submission: Submission<SignupUpdate>,
) -> Result<Response, ApiError> {
    let update = submission.body;
    let signup = with_conn(&state, "update_signup", move |conn| {
        match update_signup(conn, id, &update)? {
            UpdateOutcome::NotFound => Ok(None),
            UpdateOutcome::Updated => Ok(get_signup(conn, id)?),
        }
    })
    .await?
    .ok_or_else(|| not_found("signup", id))?;

    Ok(submission_response(submission.kind, "/trips_users", signup))
}

/// Handler for `DELETE /trips_users/{id}`.
pub async fn delete_signup_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match with_conn(&state, "delete_signup", move |conn| Ok(delete_signup(conn, id)?)).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(signup_id = id, "trip signup deleted");
            Ok(Json(json!({"status": "deleted", "id": id})))
        }
        DeleteOutcome::NotFound => Err(not_found("signup", id)),
    }
}

/// Handler for `GET /roles`. Roles are read-only over HTTP.
pub async fn list_roles_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Role>>, ApiError> {
    let roles = with_conn(&state, "list_roles", |conn| Ok(list_roles(conn)?)).await?;
    Ok(Json(roles))
}
