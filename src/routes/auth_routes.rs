//! Operator session endpoints
//!
//! - POST   /auth - check credentials, set the `admin_session` cookie
//! - DELETE /auth - clear the cookie
//! - GET    /auth - report whether the current cookie is valid

use bytes::Bytes;
use hyper::{Request, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::response::{
    add_cookie, error_json, error_response, json_response, now_ms, parse_json_body, HttpResponse,
};
use crate::auth::{SessionState, SetCookie, SESSION_COOKIE};
use crate::server::AppState;
use crate::types::LeadwayError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

fn expires_at(issued_at_ms: i64, window_ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(issued_at_ms.saturating_add(window_ms))
        .map(|t| t.to_rfc3339())
}

/// POST /auth
pub async fn handle_login(state: Arc<AppState>, req: Request<Bytes>) -> HttpResponse {
    let Some(admin) = &state.admin else {
        return error_json(StatusCode::NOT_IMPLEMENTED, "Admin login is not configured");
    };

    let body: LoginRequest = match parse_json_body(&req).and_then(|v| {
        serde_json::from_value(v).map_err(|_| LeadwayError::BadRequest("Invalid JSON body".into()))
    }) {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };

    let (Some(email), Some(password)) = (
        body.email.filter(|e| !e.trim().is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return error_json(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    match admin.verify(&email, &password) {
        Ok(true) => {}
        Ok(false) => {
            warn!("Admin login failed for {}", email.trim());
            return error_json(StatusCode::UNAUTHORIZED, "Invalid credentials");
        }
        Err(e) => return error_response(&e),
    }

    let now = now_ms();
    let token = match state.sessions.issue(now) {
        Ok(token) => token,
        Err(e) => return error_response(&e),
    };

    info!("Admin login: {}", admin.email());

    let mut resp = json_response(
        StatusCode::OK,
        &SessionResponse {
            authenticated: true,
            email: Some(admin.email().to_string()),
            expires_at: expires_at(now, state.sessions.window_ms()),
        },
    );
    add_cookie(
        &mut resp,
        &SetCookie::new(SESSION_COOKIE, token, state.sessions.window_ms() / 1000)
            .secure(state.args.cookie_secure)
            .strict(),
    );
    resp
}

/// DELETE /auth
pub async fn handle_logout(state: Arc<AppState>, _req: Request<Bytes>) -> HttpResponse {
    let mut resp = json_response(StatusCode::OK, &serde_json::json!({ "success": true }));
    add_cookie(
        &mut resp,
        &SetCookie::expired(SESSION_COOKIE)
            .secure(state.args.cookie_secure)
            .strict(),
    );
    resp
}

/// GET /auth
pub async fn handle_session_status(state: Arc<AppState>, req: Request<Bytes>) -> HttpResponse {
    let body = match state.sessions.check_headers(req.headers(), now_ms()) {
        SessionState::Authenticated {
            email,
            issued_at_ms,
        } => SessionResponse {
            authenticated: true,
            email: Some(email),
            expires_at: expires_at(issued_at_ms, state.sessions.window_ms()),
        },
        SessionState::Unauthenticated(reason) => {
            debug!(%reason, "No admin session");
            SessionResponse {
                authenticated: false,
                email: None,
                expires_at: None,
            }
        }
    };
    json_response(StatusCode::OK, &body)
}

/// Run the session guard; `Err` carries the 401 to return
pub fn require_admin(state: &AppState, req: &Request<Bytes>) -> Result<String, HttpResponse> {
    match state.sessions.check_headers(req.headers(), now_ms()) {
        SessionState::Authenticated { email, .. } => Ok(email),
        SessionState::Unauthenticated(reason) => {
            warn!(%reason, path = req.uri().path(), "Rejected admin request");
            Err(error_json(StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}
