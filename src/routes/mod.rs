//! HTTP routes for Leadway

pub mod admin;
pub mod analytics;
pub mod assessment;
pub mod auth_routes;
pub mod contact;
pub mod health;
pub mod response;
pub mod tools;

use bytes::Bytes;
use hyper::{Method, Request, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::server::AppState;
use response::{apply_cors, error_json, preflight_response, HttpResponse};

pub use health::{health_check, version_info};

/// Paths that exist under some method; anything else is a 404
const KNOWN_PATHS: [&str; 11] = [
    "/health",
    "/healthz",
    "/version",
    "/auth",
    "/analytics",
    "/analytics/journey",
    "/contact",
    "/assessment",
    "/tools",
    "/admin/leads",
    "/admin/leads/export",
];

/// Dispatch a request with a collected body
pub async fn route(state: Arc<AppState>, addr: SocketAddr, req: Request<Bytes>) -> HttpResponse {
    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_string();
    let path = if path.is_empty() { "/".to_string() } else { path };

    info!("[{}] {} {}", addr, method, path);

    let mut response = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => preflight_response(),

        (&Method::GET, "/health") | (&Method::GET, "/healthz") => {
            health::health_check(Arc::clone(&state)).await
        }
        (&Method::GET, "/version") => health::version_info(),

        // Operator session
        (&Method::POST, "/auth") => auth_routes::handle_login(Arc::clone(&state), req).await,
        (&Method::DELETE, "/auth") => auth_routes::handle_logout(Arc::clone(&state), req).await,
        (&Method::GET, "/auth") => {
            auth_routes::handle_session_status(Arc::clone(&state), req).await
        }

        // Tracking
        (&Method::POST, "/analytics") => {
            analytics::handle_beacon(Arc::clone(&state), addr, req).await
        }
        (&Method::POST, "/analytics/journey") => {
            analytics::handle_journey(Arc::clone(&state), req).await
        }

        // Lead capture
        (&Method::POST, "/contact") => contact::handle_contact(Arc::clone(&state), req).await,
        (&Method::POST, "/assessment") => {
            assessment::handle_submit(Arc::clone(&state), req).await
        }
        (&Method::GET, p) if p.starts_with("/assessment/") => {
            match p.strip_prefix("/assessment/").filter(|id| !id.contains('/')) {
                Some(id) => assessment::handle_get(Arc::clone(&state), id).await,
                None => error_json(StatusCode::NOT_FOUND, "Not found"),
            }
        }
        (&Method::GET, "/tools") => tools::list_tools(Arc::clone(&state)),

        // Admin
        (&Method::GET, "/admin/leads/export") => {
            admin::handle_export(Arc::clone(&state), req).await
        }
        (&Method::GET, "/admin/leads") => admin::handle_list(Arc::clone(&state), req).await,

        (_, p) if KNOWN_PATHS.contains(&p) => {
            error_json(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        _ => error_json(StatusCode::NOT_FOUND, "Not found"),
    };

    apply_cors(&mut response, &state.args.cors_origin);
    response
}
