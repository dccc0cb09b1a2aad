//! Analytics beacons and journey events
//!
//! Both endpoints attribute the write to the visitor's placeholder lead,
//! minting the `visitor` cookie on the first tracked request.

use bytes::Bytes;
use hyper::{Request, StatusCode};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::response::{
    add_cookie, error_json, error_response, json_response, parse_json_body, HttpResponse,
};
use crate::auth::visitor::VISITOR_COOKIE_MAX_AGE_SECS;
use crate::auth::{SetCookie, VisitorIdentity, VISITOR_COOKIE};
use crate::db::schemas::LeadDoc;
use crate::intake::{client_info, AnalyticsBeacon, JourneyEvent};
use crate::server::AppState;
use crate::types::LeadwayError;

/// Resolve the visitor and their placeholder lead
async fn visitor_lead(
    state: &AppState,
    req: &Request<Bytes>,
) -> Result<(VisitorIdentity, LeadDoc), LeadwayError> {
    let visitor = state.visitors.resolve(req.headers())?;
    let lead = state.store.resolve_visitor_lead(&visitor.visitor_id).await?;
    Ok((visitor, lead))
}

fn with_visitor_cookie(state: &AppState, mut resp: HttpResponse, visitor: VisitorIdentity) -> HttpResponse {
    if let Some(token) = visitor.new_token {
        add_cookie(
            &mut resp,
            &SetCookie::new(VISITOR_COOKIE, token, VISITOR_COOKIE_MAX_AGE_SECS)
                .secure(state.args.cookie_secure),
        );
    }
    resp
}

/// POST /analytics
pub async fn handle_beacon(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Bytes>,
) -> HttpResponse {
    let beacon = match parse_json_body(&req)
        .and_then(|body| AnalyticsBeacon::from_value(&body).map_err(LeadwayError::from))
    {
        Ok(beacon) => beacon,
        Err(e) => return error_response(&e),
    };

    let (visitor, lead) = match visitor_lead(&state, &req).await {
        Ok(resolved) => resolved,
        Err(e) => return error_response(&e),
    };

    let event = beacon.event.clone();
    let doc = beacon.into_doc(&lead.lead_id, &visitor.visitor_id, client_info(req.headers(), addr));
    if let Err(e) = state.store.insert_analytics_event(doc).await {
        error!(lead_id = %lead.lead_id, %event, error = %e, "Failed to store analytics event");
        return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    }

    debug!(lead_id = %lead.lead_id, %event, "Analytics event recorded");
    with_visitor_cookie(
        &state,
        json_response(StatusCode::OK, &json!({ "success": true })),
        visitor,
    )
}

/// POST /analytics/journey
///
/// Best effort: a store failure answers 200 with `recorded: false`. Only an
/// unparseable body fails the request.
pub async fn handle_journey(state: Arc<AppState>, req: Request<Bytes>) -> HttpResponse {
    let body = match parse_json_body(&req) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Unparseable journey body");
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };
    let journey = JourneyEvent::from_value(&body);

    let (visitor, lead) = match visitor_lead(&state, &req).await {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(error = %e, "Journey event dropped: visitor lead unavailable");
            return json_response(StatusCode::OK, &json!({ "success": true, "recorded": false }));
        }
    };

    let event = journey.event.clone();
    let recorded = match state.store.insert_activity(journey.into_activity(&lead.lead_id)).await {
        Ok(()) => true,
        Err(e) => {
            warn!(lead_id = %lead.lead_id, %event, error = %e, "Journey event dropped");
            false
        }
    };

    with_visitor_cookie(
        &state,
        json_response(StatusCode::OK, &json!({ "success": true, "recorded": recorded })),
        visitor,
    )
}
