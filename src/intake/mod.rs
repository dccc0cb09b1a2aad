//! Request intake
//!
//! Turns untyped JSON bodies into validated values ready for the store.
//! Validation failures carry a fixed message and no field-level detail.

pub mod analytics;
pub mod assessment;
pub mod client;
pub mod contact;

use serde_json::{Map, Value};

use crate::types::LeadwayError;

pub use analytics::{AnalyticsBeacon, JourneyEvent};
pub use assessment::{AssessmentSubmission, ValidAssessment};
pub use client::client_info;
pub use contact::{ContactForm, ContactSubmission};

/// Why a body was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid request body")]
    Malformed,
}

impl From<IntakeError> for LeadwayError {
    fn from(err: IntakeError) -> Self {
        LeadwayError::BadRequest(err.to_string())
    }
}

/// Non-empty trimmed string field
pub(crate) fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trim an optional string, treating blank as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Something with a local part, an `@` and a dotted domain
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Rewrite a client-supplied value so it encodes to BSON.
///
/// BSON has no unsigned 64-bit integer; integers above `i64::MAX` become
/// doubles.
pub(crate) fn bson_safe(value: Value) -> Value {
    match value {
        Value::Number(n) if n.as_i64().is_none() && n.as_u64().is_some() => n
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(items.into_iter().map(bson_safe).collect()),
        Value::Object(obj) => Value::Object(obj.into_iter().map(|(k, v)| (k, bson_safe(v))).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_plausible_email() {
        assert!(is_plausible_email("jane@example.com"));
        assert!(is_plausible_email(" jane.doe+x@mail.example.co.uk "));
        assert!(!is_plausible_email("jane"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("jane@localhost"));
        assert!(!is_plausible_email("jane@@example.com"));
        assert!(!is_plausible_email("ja ne@example.com"));
    }

    #[test]
    fn test_intake_error_maps_to_bad_request() {
        let err: LeadwayError = IntakeError::MissingFields.into();
        assert_eq!(err.status_code(), hyper::StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Missing required fields");
    }

    #[test]
    fn test_bson_safe_demotes_huge_integers() {
        let value = bson_safe(serde_json::json!({
            "seq": u64::MAX,
            "nested": [{"id": 9_223_372_036_854_775_808u64}],
            "small": 42,
            "negative": -7,
        }));
        assert!(value["seq"].is_f64());
        assert!(value["nested"][0]["id"].is_f64());
        assert_eq!(value["small"], serde_json::json!(42));
        assert_eq!(value["negative"], serde_json::json!(-7));
        assert!(bson::to_bson(&value).is_ok());
    }
}
