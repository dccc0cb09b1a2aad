//! Lead document schema
//!
//! A lead is either identified (keyed by email) or an anonymous placeholder
//! keyed by a signed visitor id. Both keys carry unique sparse indexes so
//! find-or-create is a single upsert.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for leads
pub const LEAD_COLLECTION: &str = "leads";

/// How a lead first reached us
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    ContactForm,
    Assessment,
    #[default]
    Anonymous,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::ContactForm => "contact_form",
            LeadSource::Assessment => "assessment",
            LeadSource::Anonymous => "anonymous",
        }
    }
}

/// Lead document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LeadDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable lead identifier referenced by activities and assessments
    pub lead_id: String,

    /// Normalized (trimmed, lowercase) email; absent for anonymous leads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Visitor id for anonymous placeholder leads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,

    /// Derived score, only ever raised
    #[serde(default)]
    pub lead_score: i32,

    /// Number of completed assessments
    #[serde(default)]
    pub assessment_count: i32,

    #[serde(default)]
    pub source: LeadSource,

    /// Identifier in the external CRM, when synced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crm_id: Option<String>,
}

impl LeadDoc {
    /// New identified lead
    pub fn identified(lead_id: String, email: String, source: LeadSource) -> Self {
        Self {
            lead_id,
            email: Some(email),
            source,
            metadata: Metadata::new(),
            ..Default::default()
        }
    }

    /// New anonymous placeholder lead
    pub fn anonymous(lead_id: String, visitor_id: String) -> Self {
        Self {
            lead_id,
            visitor_id: Some(visitor_id),
            source: LeadSource::Anonymous,
            metadata: Metadata::new(),
            ..Default::default()
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.email.is_none()
    }
}

impl IntoIndexes for LeadDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "lead_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("lead_id_unique".to_string())
                        .build(),
                ),
            ),
            // Sparse so anonymous leads without an email don't collide
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "visitor_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name("visitor_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_desc".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for LeadDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
