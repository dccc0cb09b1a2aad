//! Admin lead endpoints
//!
//! ## Endpoints
//!
//! - `GET /admin/leads/export` - all identified leads as CSV
//! - `GET /admin/leads` - the same list as JSON
//!
//! Both run the session guard before touching the store.

use bytes::Bytes;
use hyper::{Request, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::auth_routes::require_admin;
use super::response::{csv_response, error_response, json_response, HttpResponse};
use crate::db::schemas::LeadDoc;
use crate::export::render_leads_csv;
use crate::server::AppState;

/// Lead row for the admin dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    pub lead_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub lead_score: i32,
    pub assessment_count: i32,
    pub source: &'static str,
    pub crm_id: Option<String>,
    /// RFC 3339
    pub created_at: Option<String>,
}

impl From<LeadDoc> for LeadSummary {
    fn from(lead: LeadDoc) -> Self {
        Self {
            created_at: lead.metadata.created_at_utc().map(|t| t.to_rfc3339()),
            source: lead.source.as_str(),
            lead_id: lead.lead_id,
            email: lead.email,
            name: lead.name,
            company: lead.company,
            website: lead.website,
            phone: lead.phone,
            lead_score: lead.lead_score,
            assessment_count: lead.assessment_count,
            crm_id: lead.crm_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeadListResponse {
    pub leads: Vec<LeadSummary>,
    pub total: usize,
}

/// GET /admin/leads/export
pub async fn handle_export(state: Arc<AppState>, req: Request<Bytes>) -> HttpResponse {
    let admin = match require_admin(&state, &req) {
        Ok(email) => email,
        Err(resp) => return resp,
    };

    let leads = match state.store.list_leads().await {
        Ok(leads) => leads,
        Err(e) => return error_response(&e),
    };

    info!(admin = %admin, count = leads.len(), "Exporting leads");
    let filename = format!("leads-{}.csv", chrono::Utc::now().format("%Y-%m-%d"));
    csv_response(&filename, render_leads_csv(&leads))
}

/// GET /admin/leads
pub async fn handle_list(state: Arc<AppState>, req: Request<Bytes>) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    match state.store.list_leads().await {
        Ok(leads) => {
            let leads: Vec<LeadSummary> = leads.into_iter().map(LeadSummary::from).collect();
            json_response(
                StatusCode::OK,
                &LeadListResponse {
                    total: leads.len(),
                    leads,
                },
            )
        }
        Err(e) => error_response(&e),
    }
}
