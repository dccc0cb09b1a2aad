//! Analytics event document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for analytics events
pub const ANALYTICS_EVENT_COLLECTION: &str = "analytics_events";

/// Request-derived client details. The raw IP is never stored.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// SHA-256 hex digest of the client IP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

/// Page-view / funnel beacon
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnalyticsEventDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub event_id: String,

    pub lead_id: String,

    pub visitor_id: String,

    /// Event name, e.g. `page_view`, `assessment_step`
    pub event: String,

    pub page: String,

    /// Timestamp as reported by the browser, kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<serde_json::Value>,

    /// Any other fields the beacon carried
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,

    #[serde(default)]
    pub client: ClientInfo,
}

impl IntoIndexes for AnalyticsEventDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "event": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("event_time".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "page": 1 },
                Some(IndexOptions::builder().name("page_index".to_string()).build()),
            ),
            (
                doc! { "lead_id": 1 },
                Some(IndexOptions::builder().name("lead_index".to_string()).build()),
            ),
        ]
    }
}

impl MutMetadata for AnalyticsEventDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
