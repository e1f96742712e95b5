#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use std::time::Duration;
use tempfile::TempDir;
use trailhead_db::{open_database, DbPool, DbRuntimeSettings};
use trailhead_server::{app, AppState};

pub const PHOTO: &str = "http://cdn.danspapers.com/wp-content/uploads/2013/10/BurritoMeme.jpg";

/// A router over a fresh, migrated, file-backed database.
///
/// The `TempDir` must outlive the router.
pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    _dir: TempDir,
}

pub fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trailhead.db");
    let pool = open_database(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();

    let state = AppState {
        pool: pool.clone(),
        request_timeout: Duration::from_secs(5),
    };

    TestApp {
        router: app(state),
        pool,
        _dir: dir,
    }
}

/// Seeds three trips (ids 1-3), one user (id 1) signed up for all of them.
pub fn seed_fixtures(pool: &DbPool) {
    let conn = pool.get().unwrap();
    conn.execute_batch(&format!(
        "INSERT INTO trips (id, name, photo, description, dates, cost, numberOfPeople) VALUES
            (1, 'Paria Canyon', '{PHOTO}', 'Best trip I''ve ever been on. Sweet Canyon.', '4/14/17 - 4/22/17', '$1.00', 0),
            (2, 'Vestal Peak', '{PHOTO}', 'Totally rad mountain, yo', '5/14/17 - 5/22/17', '$1,000,000', 0),
            (3, 'Thailand', '{PHOTO}', 'It''s a foreign country', '7/15/17 - 8/22/17', '$14', 0);
         INSERT INTO users (id, first_name, last_name, email) VALUES
            (1, 'Unicorn', 'McHikeaton', 'shmee@shmee.com');
         INSERT INTO trips_users (id, trip_id, user_id, stripe_id) VALUES
            (1, 1, 1, 'ajbjsdse'),
            (2, 2, 1, 'ajbjsdse'),
            (3, 3, 1, 'ajbjsdse');"
    ))
    .unwrap();
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_json(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn form_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn content_type(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
