//! Trip API handlers.

use crate::api::{
    not_found, submission_response, wants_json, with_conn, ApiError, Submission,
};
use crate::{html, AppState};
use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use trailhead_trips::{
    create_trip, delete_trip, get_trip, list_trips, update_trip, DeleteOutcome, NewTrip, Trip,
    TripUpdate, UpdateOutcome,
};

/// Handler for `GET /trips`.
///
/// Renders an HTML page unless the client's `Accept` header asks for JSON.
pub async fn list_trips_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let trips = with_conn(&state, "list_trips", |conn| Ok(list_trips(conn)?)).await?;

    if wants_json(&headers) {
        Ok(Json(trips).into_response())
    } else {
        Ok(Html(html::trips_page(&trips)).into_response())
    }
}

/// Handler for `GET /trips/{id}`.
pub async fn get_trip_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Trip>, ApiError> {
    let trip = with_conn(&state, "get_trip", move |conn| Ok(get_trip(conn, id)?)).await?;
    trip.map(Json).ok_or_else(|| not_found("trip", id))
}

/// Handler for `POST /trips`.
pub async fn create_trip_handler(
    Extension(state): Extension<Arc<AppState>>,
    submission: Submission<NewTrip>,
) -> Result<Response, ApiError> {
    let new = submission.body;
    let trip = with_conn(&state, "create_trip", move |conn| Ok(create_trip(conn, &new)?)).await?;

    tracing::info!(trip_id = trip.id, "trip created");
    Ok(submission_response(submission.kind, "/trips", trip))
}

/// Handler for `PUT /trips/{id}`.
///
/// Applies a partial update and answers with the stored trip.
pub async fn update_trip_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
    submission: Submission<TripUpdate>,
) -> Result<Response, ApiError> {
    let update = submission.body;
    let trip = with_conn(&state, "update_trip", move |conn| {
        match update_trip(conn, id, &update)? {
            UpdateOutcome::NotFound => Ok(None),
            UpdateOutcome::Updated => Ok(get_trip(conn, id)?),
        }
    })
    .await?
    .ok_or_else(|| not_found("trip", id))?;

    Ok(submission_response(submission.kind, "/trips", trip))
}

/// Handler for `DELETE /trips/{id}`.
pub async fn delete_trip_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match with_conn(&state, "delete_trip", move |conn| Ok(delete_trip(conn, id)?)).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(trip_id = id, "trip deleted");
            Ok(Json(json!({"status": "deleted", "id": id})))
        }
        DeleteOutcome::NotFound => Err(not_found("trip", id)),
    }
}
