//! Activity document schema
//!
//! Append-only record of something a lead did (form submission, journey
//! step, completed assessment).

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for activities
pub const ACTIVITY_COLLECTION: &str = "activities";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ActivityDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub activity_id: String,

    /// Owning lead
    pub lead_id: String,

    /// e.g. `contact_form_submitted`, `assessment_completed`, or a journey event name
    pub activity_type: String,

    /// Page the activity originated on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Free-form detail bag supplied by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ActivityDoc {
    pub fn new(lead_id: &str, activity_type: impl Into<String>) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            activity_id: Uuid::new_v4().to_string(),
            lead_id: lead_id.to_string(),
            activity_type: activity_type.into(),
            page: None,
            details: None,
        }
    }

    pub fn with_page(mut self, page: Option<String>) -> Self {
        self.page = page;
        self
    }

    pub fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.details = details;
        self
    }
}

impl IntoIndexes for ActivityDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "lead_id": 1, "metadata.created_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("lead_timeline".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ActivityDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
