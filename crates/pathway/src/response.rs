use axum::body::Bytes;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::handler::Response;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";

// -- Shared helpers --

fn insert_header(headers: &mut HeaderMap, key: HeaderName, value: &str) {
    if let Ok(val) = HeaderValue::from_str(value) {
        headers.insert(key, val);
    }
}

/// Response with the given status, body and optional content type
///
/// `content-length` is always set from the body.
pub fn with_status(status: StatusCode, body: impl Into<Bytes>, content_type: Option<&str>) -> Response {
    let body = body.into();
    let len = body.len();
    let mut res = Response::new(body);
    *res.status_mut() = status;

    let headers = res.headers_mut();
    if let Some(content_type) = content_type {
        insert_header(headers, CONTENT_TYPE, content_type);
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    res
}

/// `200 OK` plain text
pub fn text(body: impl Into<Bytes>) -> Response {
    with_status(StatusCode::OK, body, Some(TEXT_PLAIN))
}

/// `200 OK` HTML
pub fn html(body: impl Into<Bytes>) -> Response {
    with_status(StatusCode::OK, body, Some(TEXT_HTML))
}

/// `200 OK` raw bytes, typed when the MIME type is known
pub fn bytes(body: impl Into<Bytes>, mime_type: Option<&str>) -> Response {
    with_status(StatusCode::OK, body, mime_type)
}

/// `200 OK` JSON
pub fn json<T: serde::Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => with_status(StatusCode::OK, body, Some("application/json")),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize JSON response");
            internal_error()
        }
    }
}

/// Plain `404 Not Found`
pub fn not_found() -> Response {
    with_status(StatusCode::NOT_FOUND, "Not Found", Some(TEXT_PLAIN))
}

/// Generic `500 Internal Server Error`; never carries error detail
pub fn internal_error() -> Response {
    with_status(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        Some(TEXT_PLAIN),
    )
}
