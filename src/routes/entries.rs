//! HTTP routes for journal entries
//!
//! - GET  /api/entries - list index records (public)
//! - POST /api/entries - create an entry (Bearer token required)

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{error_response, json_response, parse_json_body};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct CreateEntryResponse {
    pub ok: bool,
    pub id: Uuid,
}

/// GET /api/entries
pub async fn handle_list_entries(state: &AppState) -> Response<Full<Bytes>> {
    let records = state.entries.list().await;
    debug!(count = records.len(), "Listing entries");
    json_response(StatusCode::OK, &records)
}

/// POST /api/entries
pub async fn handle_create_entry(
    state: &AppState,
    auth_header: Option<&str>,
    body: &Bytes,
) -> Response<Full<Bytes>> {
    let principal = match state.auth.authenticate_header(auth_header) {
        Ok(p) => p,
        Err(e) => return error_response(&e, "Failed to create entry"),
    };

    let request: CreateEntryRequest = match parse_json_body(body) {
        Ok(r) => r,
        Err(e) => return error_response(&e, "Failed to create entry"),
    };

    debug!(username = %principal.username, "Creating entry");

    match state.entries.create(&request.title, &request.body).await {
        Ok(id) => json_response(StatusCode::CREATED, &CreateEntryResponse { ok: true, id }),
        Err(e) => error_response(&e, "Failed to create entry"),
    }
}
