//! Analytics beacons and journey events

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{bson_safe, string_field, IntakeError};
use crate::db::schemas::{ActivityDoc, AnalyticsEventDoc, ClientInfo, Metadata};

/// Keys lifted out of a beacon body; everything else lands in `extra`
const BEACON_KEYS: [&str; 5] = ["event", "page", "timestamp", "assessment_type", "step"];

/// Event name recorded when a journey body doesn't name one
pub const UNKNOWN_EVENT: &str = "unknown";

/// Validated `POST /analytics` body
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsBeacon {
    pub event: String,
    pub page: String,
    pub timestamp: Option<String>,
    pub assessment_type: Option<String>,
    pub step: Option<Value>,
    pub extra: Option<Value>,
}

impl AnalyticsBeacon {
    /// Requires non-empty string `event` and `page`
    pub fn from_value(value: &Value) -> Result<Self, IntakeError> {
        let obj = value.as_object().ok_or(IntakeError::MissingFields)?;

        let (Some(event), Some(page)) = (string_field(obj, "event"), string_field(obj, "page")) else {
            return Err(IntakeError::MissingFields);
        };

        // Browsers send either an ISO string or epoch millis
        let timestamp = match obj.get("timestamp") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let extra: Map<String, Value> = obj
            .iter()
            .filter(|(k, _)| !BEACON_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), bson_safe(v.clone())))
            .collect();

        Ok(Self {
            event,
            page,
            timestamp,
            assessment_type: string_field(obj, "assessment_type"),
            step: obj.get("step").filter(|v| !v.is_null()).cloned().map(bson_safe),
            extra: (!extra.is_empty()).then_some(Value::Object(extra)),
        })
    }

    pub fn into_doc(self, lead_id: &str, visitor_id: &str, client: ClientInfo) -> AnalyticsEventDoc {
        AnalyticsEventDoc {
            _id: None,
            metadata: Metadata::new(),
            event_id: Uuid::new_v4().to_string(),
            lead_id: lead_id.to_string(),
            visitor_id: visitor_id.to_string(),
            event: self.event,
            page: self.page,
            client_timestamp: self.timestamp,
            assessment_type: self.assessment_type,
            step: self.step,
            extra: self.extra,
            client,
        }
    }
}

/// `POST /analytics/journey` body. Nothing is required.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyEvent {
    pub event: String,
    pub page: Option<String>,
    pub metadata: Option<Value>,
}

impl JourneyEvent {
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        Self {
            event: string_field(obj, "event").unwrap_or_else(|| UNKNOWN_EVENT.to_string()),
            page: string_field(obj, "page"),
            metadata: obj.get("metadata").filter(|v| v.is_object()).cloned().map(bson_safe),
        }
    }

    pub fn into_activity(self, lead_id: &str) -> ActivityDoc {
        ActivityDoc::new(lead_id, self.event)
            .with_page(self.page)
            .with_details(self.metadata)
    }
}
