//! Contact form endpoint

use bytes::Bytes;
use hyper::{Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::response::{error_response, json_response, parse_json_body, HttpResponse};
use crate::db::schemas::ActivityDoc;
use crate::intake::ContactSubmission;
use crate::server::AppState;
use crate::types::LeadwayError;

pub const CONTACT_ACTIVITY: &str = "contact_form_submitted";

/// POST /contact
pub async fn handle_contact(state: Arc<AppState>, req: Request<Bytes>) -> HttpResponse {
    let form = match parse_json_body(&req).and_then(|body| {
        ContactSubmission::from_value(body)
            .and_then(ContactSubmission::validate)
            .map_err(LeadwayError::from)
    }) {
        Ok(form) => form,
        Err(e) => return error_response(&e),
    };

    let lead = match state.store.upsert_lead_by_email(form.contact).await {
        Ok(lead) => lead,
        Err(e) => return error_response(&e),
    };
    if let Err(e) = state.store.record_contact(&lead.lead_id).await {
        return error_response(&e);
    }

    let details = form.message.map(|message| json!({ "message": message }));
    let activity = ActivityDoc::new(&lead.lead_id, CONTACT_ACTIVITY)
        .with_page(form.page)
        .with_details(details);
    if let Err(e) = state.store.insert_activity(activity).await {
        // The lead is already saved; losing the activity row is not fatal
        warn!(lead_id = %lead.lead_id, error = %e, "Failed to record contact activity");
    }

    info!(lead_id = %lead.lead_id, "Contact form submitted");
    json_response(
        StatusCode::OK,
        &json!({ "success": true, "lead_id": lead.lead_id }),
    )
}
