//! Health check and version endpoints
//!
//! - /health, /healthz - liveness plus a store ping
//!
//! Liveness always answers 200 while the process is up. A failed store ping
//! reports `degraded` in the body instead of failing the probe.

use hyper::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use super::response::{json_response, HttpResponse};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    /// `online` or `degraded`
    pub status: &'static str,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub store: StoreHealth,
    /// Whether assessments get an LLM narrative
    pub narrative_enabled: bool,
    pub dev_mode: bool,
}

#[derive(Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub git_commit: &'static str,
    pub git_commit_full: &'static str,
    pub build_timestamp: &'static str,
}

/// GET /health, /healthz
pub async fn health_check(state: Arc<AppState>) -> HttpResponse {
    let (reachable, error) = match state.store.ping().await {
        Ok(()) => (true, None),
        Err(e) => {
            warn!(backend = state.store.backend(), error = %e, "Store ping failed");
            (false, Some(e.public_message()))
        }
    };

    let response = HealthResponse {
        healthy: true,
        status: if reachable { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        store: StoreHealth {
            backend: state.store.backend(),
            reachable,
            error,
        },
        narrative_enabled: state.llm.is_some(),
        dev_mode: state.args.dev_mode,
    };

    json_response(StatusCode::OK, &response)
}

/// GET /version
pub fn version_info() -> HttpResponse {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            git_commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            git_commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
            build_timestamp: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        },
    )
}
