//! Assessment document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::scoring::{Narrative, NarrativeStatus, Questionnaire, ScoreReport};

/// Collection name for assessments
pub const ASSESSMENT_COLLECTION: &str = "assessments";

/// A completed assessment. Written once, never updated.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AssessmentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub assessment_id: String,

    pub lead_id: String,

    /// Which tool produced it
    pub tool_id: String,

    pub answers: Questionnaire,

    pub report: ScoreReport,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Narrative>,

    #[serde(default)]
    pub narrative_status: NarrativeStatus,
}

impl IntoIndexes for AssessmentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "assessment_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("assessment_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "lead_id": 1 },
                Some(IndexOptions::builder().name("lead_index".to_string()).build()),
            ),
        ]
    }
}

impl MutMetadata for AssessmentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
