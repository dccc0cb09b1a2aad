//! Response helpers
//!
//! Every body is JSON except the CSV export. Errors are `{"error": "..."}`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{
    HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE,
};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::auth::SetCookie;
use crate::types::LeadwayError;

pub type HttpResponse = Response<Full<Bytes>>;

const ALLOWED_METHODS: &str = "GET, POST, DELETE, OPTIONS";

fn response(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> HttpResponse {
    let mut resp = Response::new(Full::new(body.into()));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

/// JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    response(status, "application/json", json)
}

/// `{"error": message}` with the given status
pub fn error_json(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &json!({ "error": message }))
}

/// Map an error to its response. Server-side failures are logged in full
/// and answered with a generic message.
pub fn error_response(err: &LeadwayError) -> HttpResponse {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        warn!(status = status.as_u16(), error = %err, "Request rejected");
    }
    error_json(status, &err.public_message())
}

/// Downloadable CSV
pub fn csv_response(filename: &str, body: String) -> HttpResponse {
    let mut resp = response(StatusCode::OK, "text/csv; charset=utf-8", body);
    set_header(
        &mut resp,
        CONTENT_DISPOSITION,
        &format!("attachment; filename=\"{}\"", filename),
    );
    resp.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp
}

/// CORS preflight response
pub fn preflight_response() -> HttpResponse {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = StatusCode::NO_CONTENT;
    resp.headers_mut()
        .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    resp
}

/// Attach CORS headers for `origin`; credentials are allowed only for a
/// specific origin
pub fn apply_cors(resp: &mut HttpResponse, origin: &str) {
    set_header(resp, ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    let headers = resp.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    if origin != "*" {
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    }
}

/// Append a `Set-Cookie` header
pub fn add_cookie(resp: &mut HttpResponse, cookie: &SetCookie) {
    match HeaderValue::from_str(&cookie.to_header_value()) {
        Ok(value) => {
            resp.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => error!("Unrenderable Set-Cookie header: {}", e),
    }
}

fn set_header(resp: &mut HttpResponse, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            resp.headers_mut().insert(name, value);
        }
        Err(e) => error!("Invalid {} header value: {}", name, e),
    }
}

/// Parse the request body as JSON
pub fn parse_json_body(req: &Request<Bytes>) -> Result<Value, LeadwayError> {
    serde_json::from_slice(req.body()).map_err(|_| LeadwayError::BadRequest("Invalid JSON body".into()))
}

/// Wall clock in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_hides_server_detail() {
        let resp = error_response(&LeadwayError::Database("secret dsn".into()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_cors_credentials_only_for_specific_origin() {
        let mut resp = json_response(StatusCode::OK, &json!({}));
        apply_cors(&mut resp, "*");
        assert!(resp.headers().get(ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());

        let mut resp = json_response(StatusCode::OK, &json!({}));
        apply_cors(&mut resp, "https://consultancy.example");
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://consultancy.example");
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[test]
    fn test_csv_response_headers() {
        let resp = csv_response("leads.csv", "\"Email\"".into());
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            resp.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"leads.csv\""
        );
    }
}
