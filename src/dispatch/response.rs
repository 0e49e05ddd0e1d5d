use bytes::Bytes;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ALLOW, CONTENT_TYPE,
};
use http::{HeaderName, HeaderValue, StatusCode};
use serde_json::{Value, json};

use super::DispatchError;
use crate::matcher::ResolvedLeaf;
use crate::types::Response;

pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    let mut response = Response::new(Bytes::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

pub fn json(status: StatusCode, value: &Value) -> Response {
    let body = serde_json::to_vec(value).unwrap_or_default();
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// 204 answer to an `OPTIONS` request on a leaf that declares no `OPTIONS`
/// operation. The request `Origin` is echoed back, `*` without one.
pub fn preflight(leaf: &ResolvedLeaf, origin: Option<&HeaderValue>) -> Response {
    let mut response = empty(StatusCode::NO_CONTENT);
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        origin
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*")),
    );
    insert_text(headers, ACCESS_CONTROL_ALLOW_METHODS, leaf.allow_header());
    if !leaf.cors_allow_headers().is_empty() {
        insert_text(headers, ACCESS_CONTROL_ALLOW_HEADERS, leaf.cors_allow_headers());
    }
    response
}

/// Terminal response for a short-circuited request. Client errors carry only
/// the canonical reason, never the validation detail.
pub fn from_error(error: &DispatchError) -> Response {
    let status = error.status();
    let reason = status.canonical_reason().unwrap_or("Client Closed Request");
    let mut response = json(
        status,
        &json!({ "statusCode": status.as_u16(), "error": reason }),
    );
    if let DispatchError::MethodNotAllowed { allow, .. } = error {
        insert_text(response.headers_mut(), ALLOW, allow);
    }
    response
}

fn insert_text(headers: &mut http::HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "header value is not valid ascii; omitted"),
    }
}
