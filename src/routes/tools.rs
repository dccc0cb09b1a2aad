//! Assessment tool listing

use hyper::StatusCode;
use serde_json::json;
use std::sync::Arc;

use super::response::{json_response, HttpResponse};
use crate::server::AppState;

/// GET /tools
pub fn list_tools(state: Arc<AppState>) -> HttpResponse {
    json_response(StatusCode::OK, &json!({ "tools": state.tools.active() }))
}
