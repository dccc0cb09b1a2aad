//! Assessment endpoints
//!
//! - POST /assessment      - score a questionnaire, narrate it, persist it
//! - GET  /assessment/{id} - fetch a stored result
//!
//! Results are addressed by an unguessable uuid and exclude the raw answers.

use bytes::Bytes;
use hyper::{Request, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::response::{error_json, error_response, json_response, parse_json_body, HttpResponse};
use crate::db::schemas::{ActivityDoc, AssessmentDoc, Metadata};
use crate::intake::AssessmentSubmission;
use crate::scoring::{self, Narrative, NarrativeStatus, ScoreReport};
use crate::server::AppState;
use crate::types::LeadwayError;

pub const ASSESSMENT_ACTIVITY: &str = "assessment_completed";

#[derive(Debug, Serialize)]
struct AssessmentResponse<'a> {
    success: bool,
    assessment_id: &'a str,
    lead_id: &'a str,
    tool_id: &'a str,
    report: &'a ScoreReport,
    narrative: Option<&'a Narrative>,
    narrative_status: NarrativeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

impl<'a> AssessmentResponse<'a> {
    fn from_doc(doc: &'a AssessmentDoc) -> Self {
        Self {
            success: true,
            assessment_id: &doc.assessment_id,
            lead_id: &doc.lead_id,
            tool_id: &doc.tool_id,
            report: &doc.report,
            narrative: doc.narrative.as_ref(),
            narrative_status: doc.narrative_status,
            created_at: doc.metadata.created_at_utc().map(|t| t.to_rfc3339()),
        }
    }
}

/// POST /assessment
pub async fn handle_submit(state: Arc<AppState>, req: Request<Bytes>) -> HttpResponse {
    let submission = match parse_json_body(&req).and_then(|body| {
        AssessmentSubmission::from_value(body)
            .and_then(AssessmentSubmission::validate)
            .map_err(LeadwayError::from)
    }) {
        Ok(submission) => submission,
        Err(e) => return error_response(&e),
    };

    if state.tools.find_active(&submission.tool_id).is_none() {
        warn!(tool_id = %submission.tool_id, "Assessment for unknown tool");
        return error_json(StatusCode::BAD_REQUEST, "Unknown assessment tool");
    }

    let report = scoring::score(&submission.answers);
    let outcome = scoring::augment(
        state.llm.as_deref(),
        &submission.answers,
        &report,
        state.args.ai_max_tokens,
    )
    .await;

    let lead = match state.store.upsert_lead_by_email(submission.contact).await {
        Ok(lead) => lead,
        Err(e) => return error_response(&e),
    };

    let doc = AssessmentDoc {
        _id: None,
        metadata: Metadata::new(),
        assessment_id: Uuid::new_v4().to_string(),
        lead_id: lead.lead_id.clone(),
        tool_id: submission.tool_id,
        answers: submission.answers,
        report,
        narrative: outcome.narrative,
        narrative_status: outcome.status,
    };

    if let Err(e) = state.store.insert_assessment(doc.clone()).await {
        return error_response(&e);
    }
    let score = i32::try_from(doc.report.score).unwrap_or(i32::MAX);
    if let Err(e) = state.store.record_assessment_outcome(&lead.lead_id, score).await {
        return error_response(&e);
    }

    let activity = ActivityDoc::new(&lead.lead_id, ASSESSMENT_ACTIVITY).with_details(Some(
        serde_json::json!({
            "assessment_id": doc.assessment_id,
            "tool_id": doc.tool_id,
            "score": doc.report.score,
            "tier": doc.report.tier.as_str(),
        }),
    ));
    if let Err(e) = state.store.insert_activity(activity).await {
        warn!(lead_id = %lead.lead_id, error = %e, "Failed to record assessment activity");
    }

    info!(
        lead_id = %lead.lead_id,
        assessment_id = %doc.assessment_id,
        score = doc.report.score,
        narrative = doc.narrative_status.as_str(),
        "Assessment completed"
    );

    json_response(StatusCode::OK, &AssessmentResponse::from_doc(&doc))
}

/// GET /assessment/{id}
pub async fn handle_get(state: Arc<AppState>, assessment_id: &str) -> HttpResponse {
    match state.store.get_assessment(assessment_id).await {
        Ok(Some(doc)) => json_response(StatusCode::OK, &AssessmentResponse::from_doc(&doc)),
        Ok(None) => error_json(StatusCode::NOT_FOUND, "Assessment not found"),
        Err(e) => error_response(&e),
    }
}
