//! Shared plumbing for the HTTP handlers: the error type, the blocking
//! database hand-off, body extraction and response shaping.

use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Form, FromRequest, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use trailhead_trips::StoreError;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidReference(msg) | StoreError::Constraint(msg) => {
                ApiError::Unprocessable(msg)
            }
            StoreError::Database(err) => {
                tracing::error!(error = %err, "database operation failed");
                ApiError::InternalServerError("database operation failed".to_string())
            }
        }
    }
}

/// Runs `f` with a pooled connection on the blocking thread pool.
///
/// `op` names the operation in logs when the pool or the task fails.
pub(crate) async fn with_conn<T, F>(state: &AppState, op: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, op, "failed to get db connection");
            ApiError::InternalServerError("database unavailable".to_string())
        })?;
        f(&mut conn)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, op, "database task join error");
        ApiError::InternalServerError("database task failed".to_string())
    })?
}

/// How a POST/PUT body was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    /// `application/json`: answered with the record as JSON.
    Json,
    /// `application/x-www-form-urlencoded`: answered with a redirect.
    Form,
}

/// A request body accepted either as JSON or as an HTML form.
#[derive(Debug)]
pub struct Submission<T> {
    pub body: T,
    pub kind: SubmissionKind,
}

impl<S, T> FromRequest<S> for Submission<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let method = req.method().clone();
            let raw = Bytes::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;

            let mut req = Request::new(Body::from(drop_blank_fields(&raw)));
            *req.method_mut() = method;
            req.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );

            let Form(body) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self {
                body,
                kind: SubmissionKind::Form,
            })
        } else {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self {
                body,
                kind: SubmissionKind::Json,
            })
        }
    }
}

/// Re-encodes a form body without the fields that were left blank.
///
/// Browsers submit `photo=` for an empty input. Such a field counts as
/// absent: it takes its schema default on insert and is left alone on update.
fn drop_blank_fields(raw: &[u8]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form_urlencoded::parse(raw).filter(|(_, value)| !value.is_empty()))
        .finish()
}

/// Answers a successful submission.
///
/// JSON submissions get `200 OK` with `record`. Form submissions get
/// `302 Found` pointing at `location`, still carrying `record` as the body.
pub(crate) fn submission_response<T: Serialize>(
    kind: SubmissionKind,
    location: &str,
    record: T,
) -> Response {
    match kind {
        SubmissionKind::Json => Json(record).into_response(),
        SubmissionKind::Form => (
            StatusCode::FOUND,
            [(header::LOCATION, location.to_string())],
            Json(record),
        )
            .into_response(),
    }
}

/// Whether the client prefers JSON over HTML, per its `Accept` header.
///
/// Each type is weighed by the most specific media range matching it. JSON
/// wins on a higher `q`, or on an equal `q` when it was named outright and
/// HTML only matched a wildcard. No header means HTML.
pub(crate) fn wants_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let Some(json) = media_preference(accept, "application", "json") else {
        return false;
    };
    if json.q <= 0.0 {
        return false;
    }

    match media_preference(accept, "text", "html") {
        None => true,
        Some(html) => (json.q, json.specificity) > (html.q, html.specificity),
    }
}

#[derive(Debug, Clone, Copy)]
struct MediaPreference {
    q: f32,
    /// 2 for `type/subtype`, 1 for `type/*`, 0 for `*/*`.
    specificity: u8,
}

fn media_preference(accept: &str, ty: &str, subtype: &str) -> Option<MediaPreference> {
    let mut best: Option<MediaPreference> = None;

    for range in accept.split(',') {
        let mut params = range.split(';');
        let media = params.next().unwrap_or_default().trim();
        let Some((range_ty, range_sub)) = media.split_once('/') else {
            continue;
        };

        let specificity = match (range_ty.trim(), range_sub.trim()) {
            ("*", "*") => 0,
            (t, "*") if t.eq_ignore_ascii_case(ty) => 1,
            (t, s) if t.eq_ignore_ascii_case(ty) && s.eq_ignore_ascii_case(subtype) => 2,
            _ => continue,
        };

        let q = params
            .filter_map(|param| param.trim().strip_prefix("q="))
            .find_map(|value| value.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        if best.map_or(true, |b| specificity > b.specificity) {
            best = Some(MediaPreference { q, specificity });
        }
    }

    best
}

/// Shorthand for the not-found error of a single entity.
pub(crate) fn not_found(entity: &str, id: i64) -> ApiError {
    ApiError::NotFound(format!("{} {} not found", entity, id))
}
