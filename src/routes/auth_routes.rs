//! HTTP route for admin login
//!
//! - POST /api/login - exchange the admin credentials for a JWT

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{error_response, json_response, parse_json_body};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Unix seconds
    pub expires_at: u64,
}

/// POST /api/login
pub fn handle_login(state: &AppState, body: &Bytes) -> Response<Full<Bytes>> {
    let request: LoginRequest = match parse_json_body(body) {
        Ok(r) => r,
        Err(e) => return error_response(&e, "Login failed"),
    };

    match state.auth.login(&request.username, &request.password) {
        Ok(issued) => json_response(
            StatusCode::OK,
            &LoginResponse {
                token: issued.token,
                expires_at: issued.expires_at,
            },
        ),
        Err(e) => error_response(&e, "Login failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_support::{body_string, test_state};

    #[tokio::test]
    async fn test_login_success() {
        let state = test_state();
        let body = Bytes::from(r#"{"username":"admin","password":"hunter2"}"#);

        let response = handle_login(&state, &body);
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        let token = json["token"].as_str().unwrap();
        assert!(json["expiresAt"].as_u64().is_some());
        assert!(state.auth.authenticate(token).is_ok());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let state = test_state();
        let body = Bytes::from(r#"{"username":"admin","password":"nope"}"#);

        let response = handle_login(&state, &body);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "Invalid credentials");
    }

    #[tokio::test]
    async fn test_login_bad_requests() {
        let state = test_state();

        for body in [r#"{"username":"admin"}"#, r#"{}"#, "not json", ""] {
            let response = handle_login(&state, &Bytes::from(body));
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }
    }
}
