//! User API handlers.

use crate::api::{not_found, submission_response, with_conn, ApiError, Submission};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use trailhead_trips::{
    create_user, delete_user, get_user, list_signups, list_users, update_user, DeleteOutcome,
    NewUser, SignupFilter, TripSignup, UpdateOutcome, User, UserUpdate,
};

/// Handler for `GET /users`.
pub async fn list_users_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = with_conn(&state, "list_users", |conn| Ok(list_users(conn)?)).await?;
    Ok(Json(users))
}

/// Handler for `GET /users/{id}`.
pub async fn get_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = with_conn(&state, "get_user", move |conn| Ok(get_user(conn, id)?)).await?;
    user.map(Json).ok_or_else(|| not_found("user", id))
}

/// Handler for `GET /users/{id}/trips_users`.
///
/// Lists the trip signups of one user; 404 if the user does not exist.
pub async fn list_user_signups_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TripSignup>>, ApiError> {
    let signups = with_conn(&state, "list_user_signups", move |conn| {
        if get_user(conn, id)?.is_none() {
            return Ok(None);
        }
        let filter = SignupFilter {
            user_id: Some(id),
            ..Default::default()
        };
        Ok(Some(list_signups(conn, filter)?))
    })
    .await?;

    signups.map(Json).ok_or_else(|| not_found("user", id))
}

/// Handler for `POST /users`.
///
/// Omitted `photo` and `role_id` take their schema defaults.
pub async fn create_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    submission: Submission<NewUser>,
) -> Result<Response, ApiError> {
    let new = submission.body;
    let user = with_conn(&state, "create_user", move |conn| Ok(create_user(conn, &new)?)).await?;

    tracing::info!(user_id = user.id, role_id = user.role_id, "user created");
    Ok(submission_response(submission.kind, "/users", user))
}

/// Handler for `PUT /users/{id}`.
pub async fn update_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    submission: Submission<UserUpdate>,
) -> Result<Response, ApiError> {
    let update = submission.body;
    let user = with_conn(&state, "update_user", move |conn| {
        match update_user(conn, id, &update)? {
            UpdateOutcome::NotFound => Ok(None),
            UpdateOutcome::Updated => Ok(get_user(conn, id)?),
        }
    })
    .await?
    .ok_or_else(|| not_found("user", id))?;

    Ok(submission_response(submission.kind, "/users", user))
}

/// Handler for `DELETE /users/{id}`.
pub async fn delete_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match with_conn(&state, "delete_user", move |conn| Ok(delete_user(conn, id)?)).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(user_id = id, "user deleted");
            Ok(Json(json!({"status": "deleted", "id": id})))
        }
        DeleteOutcome::NotFound => Err(not_found("user", id)),
    }
}
