//! Trailhead HTTP server library logic.
//!
//! Wires the data access layer in `trailhead-trips` to an axum router.
//! Handlers are thin: each one checks out a pooled connection on the
//! blocking thread pool, runs a single data access call, and maps the
//! result (including `UpdateOutcome::NotFound` and
//! `DeleteOutcome::NotFound`) onto an HTTP status.

pub mod api;
pub mod api_signups;
pub mod api_trips;
pub mod api_users;
pub mod config;
pub mod html;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use trailhead_db::DbPool;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Upper bound on handling a single request.
    pub request_timeout: Duration,
}

/// Maximum request body size (64 KiB). Trip and user payloads are tiny.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    let routes = Router::new()
        .route("/health", get(health))
        .route(
            "/trips",
            get(api_trips::list_trips_handler).post(api_trips::create_trip_handler),
        )
        .route(
            "/trips/{id}",
            get(api_trips::get_trip_handler)
                .put(api_trips::update_trip_handler)
                .delete(api_trips::delete_trip_handler),
        )
        .route(
            "/users",
            get(api_users::list_users_handler).post(api_users::create_user_handler),
        )
        .route(
            "/users/{id}",
            get(api_users::get_user_handler)
                .put(api_users::update_user_handler)
                .delete(api_users::delete_user_handler),
        )
        .route(
            "/users/{id}/trips_users",
            get(api_users::list_user_signups_handler),
        )
        .route(
            "/trips_users",
            get(api_signups::list_signups_handler).post(api_signups::create_signup_handler),
        )
        .route(
            "/trips_users/{id}",
            get(api_signups::get_signup_handler)
                .put(api_signups::update_signup_handler)
                .delete(api_signups::delete_signup_handler),
        )
        .route("/roles", get(api_signups::list_roles_handler));

    with_hardening(routes, request_timeout).layer(Extension(Arc::new(state)))
}

/// Wraps `router` in the body size cap, the request timeout (408), request
/// tracing and CORS.
fn with_hardening(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test(start_paused = true)]
    async fn slow_requests_time_out() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "done"
            }),
        );
        let router = with_hardening(router, Duration::from_secs(1));

        let response = router
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_requests_finish_within_timeout() {
        let router = Router::new().route(
            "/quick",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                "done"
            }),
        );
        let router = with_hardening(router, Duration::from_secs(1));

        let response = router
            .oneshot(Request::builder().uri("/quick").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
