//! HTTP routes for the journal backend
//!
//! Handlers take the already-collected request body and return a
//! `Full<Bytes>` response; the server adds CORS headers and boxes it.

pub mod auth_routes;
pub mod entries;
pub mod health;

pub use auth_routes::handle_login;
pub use entries::{handle_create_entry, handle_list_entries};
pub use health::{health_check, root_banner, version_info};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;

use crate::types::JournalError;

/// Largest request body the API accepts
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build a response with the given status, content type and body
pub fn response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(json) => response(status, "application/json", json),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub fn text_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    response(status, "text/plain; charset=utf-8", message.to_string())
}

/// Map an error to a response
///
/// Client errors carry their message; server errors are logged and the
/// caller only sees `public_message`.
pub fn error_response(err: &JournalError, public_message: &str) -> Response<Full<Bytes>> {
    let status = err.status_code();
    if err.is_client_error() {
        text_response(status, &err.to_string())
    } else {
        error!(error = %err, "{}", public_message);
        text_response(status, public_message)
    }
}

/// Decode a JSON request body
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, JournalError> {
    if body.len() > MAX_BODY_BYTES {
        return Err(JournalError::Http("Request body too large".into()));
    }

    serde_json::from_slice(body).map_err(|e| JournalError::Http(format!("Invalid JSON: {}", e)))
}
