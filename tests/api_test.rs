//! Integration tests for the HTTP routes
//!
//! These drive the router directly with collected bodies, backed by the
//! in-memory store and the mock narrative backend.

use async_trait::async_trait;
use bytes::Bytes;
use clap::Parser;
use http_body_util::BodyExt;
use hyper::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use hyper::{Method, Request, StatusCode};
use leadway::db::schemas::{ActivityDoc, AnalyticsEventDoc, AssessmentDoc, LeadDoc};
use leadway::db::{LeadContact, LeadStore, MemoryStore};
use leadway::llm::{LlmBackend, MockBackend};
use leadway::routes::{self, response::HttpResponse};
use leadway::{AppState, Args, LeadwayError, Result};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

const ADMIN_EMAIL: &str = "owner@consultancy.example";
const ADMIN_PASSWORD: &str = "correct horse battery";
const SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Store whose every operation fails, standing in for an unreachable database
struct FailingStore;

#[async_trait]
impl LeadStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn ping(&self) -> Result<()> {
        Err(offline())
    }

    async fn upsert_lead_by_email(&self, _contact: LeadContact) -> Result<LeadDoc> {
        Err(offline())
    }

    async fn resolve_visitor_lead(&self, _visitor_id: &str) -> Result<LeadDoc> {
        Err(offline())
    }

    async fn get_lead(&self, _lead_id: &str) -> Result<Option<LeadDoc>> {
        Err(offline())
    }

    async fn record_contact(&self, _lead_id: &str) -> Result<()> {
        Err(offline())
    }

    async fn record_assessment_outcome(&self, _lead_id: &str, _score: i32) -> Result<()> {
        Err(offline())
    }

    async fn insert_activity(&self, _activity: ActivityDoc) -> Result<()> {
        Err(offline())
    }

    async fn insert_analytics_event(&self, _event: AnalyticsEventDoc) -> Result<()> {
        Err(offline())
    }

    async fn insert_assessment(&self, _assessment: AssessmentDoc) -> Result<()> {
        Err(offline())
    }

    async fn get_assessment(&self, _assessment_id: &str) -> Result<Option<AssessmentDoc>> {
        Err(offline())
    }

    async fn list_leads(&self) -> Result<Vec<LeadDoc>> {
        Err(offline())
    }
}

fn offline() -> LeadwayError {
    LeadwayError::Database("connection refused".into())
}

fn test_args(with_admin: bool) -> Args {
    let mut argv = vec![
        "leadway",
        "--dev-mode",
        "--session-secret",
        SECRET,
        "--cookie-secure",
        "false",
        "--cors-origin",
        "https://consultancy.example",
    ];
    if with_admin {
        argv.extend_from_slice(&[
            "--admin-email",
            ADMIN_EMAIL,
            "--admin-password",
            ADMIN_PASSWORD,
        ]);
    }
    Args::parse_from(argv)
}

fn state_with(store: Arc<dyn LeadStore>, llm: Option<Arc<dyn LlmBackend>>) -> Arc<AppState> {
    Arc::new(AppState::new(test_args(true), store, llm).unwrap())
}

fn memory_state() -> (Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (state_with(store.clone(), None), store)
}

fn peer() -> SocketAddr {
    "203.0.113.7:51234".parse().unwrap()
}

fn request(method: Method, path: &str, body: &str, cookie: Option<&str>) -> Request<Bytes> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Bytes::from(body.to_string())).unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Bytes>) -> HttpResponse {
    routes::route(Arc::clone(state), peer(), req).await
}

async fn body_text(resp: HttpResponse) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: HttpResponse) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

/// `name=value` part of the first Set-Cookie header for `name`
fn cookie_pair(resp: &HttpResponse, name: &str) -> Option<String> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{}=", name)))
        .map(str::to_string)
}

async fn login(state: &Arc<AppState>) -> String {
    let body = json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }).to_string();
    let resp = send(state, request(Method::POST, "/auth", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    cookie_pair(&resp, "admin_session").unwrap()
}

fn questionnaire() -> Value {
    json!({
        "website_url": "https://acme.example",
        "role": "owner",
        "company_size": "11-50",
        "monthly_visitors": "2000-10000",
        "lead_gen_methods": ["seo", "email_marketing", "referrals"],
        "challenges": ["no_tracking"],
        "budget": "1000-5000",
        "goal": "more_leads",
    })
}

// ============================================================================
// Analytics
// ============================================================================

#[tokio::test]
async fn test_analytics_requires_event_and_page() {
    let (state, store) = memory_state();

    for body in [json!({ "page": "/" }), json!({ "event": "page_view" })] {
        let resp = send(&state, request(Method::POST, "/analytics", &body.to_string(), None)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await, json!({ "error": "Missing required fields" }));
    }
    assert_eq!(store.events_len(), 0);

    let body = json!({ "event": "page_view", "page": "/pricing" }).to_string();
    let resp = send(&state, request(Method::POST, "/analytics", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(cookie_pair(&resp, "visitor").is_some());
    assert_eq!(body_json(resp).await, json!({ "success": true }));
    assert_eq!(store.events_len(), 1);
}

#[tokio::test]
async fn test_analytics_invalid_json_is_bad_request() {
    let (state, _store) = memory_state();
    let resp = send(&state, request(Method::POST, "/analytics", "{not json", None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_returning_visitor_reuses_placeholder_lead() {
    let (state, store) = memory_state();
    let body = json!({ "event": "page_view", "page": "/" }).to_string();

    let first = send(&state, request(Method::POST, "/analytics", &body, None)).await;
    let visitor = cookie_pair(&first, "visitor").unwrap();

    let second = send(&state, request(Method::POST, "/analytics", &body, Some(&visitor))).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert!(cookie_pair(&second, "visitor").is_none());

    assert_eq!(store.leads_len(), 1);
    assert_eq!(store.events_len(), 2);
}

#[tokio::test]
async fn test_analytics_store_failure_is_500() {
    let state = state_with(Arc::new(FailingStore), None);
    let body = json!({ "event": "page_view", "page": "/" }).to_string();
    let resp = send(&state, request(Method::POST, "/analytics", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_journey_is_best_effort() {
    let (state, _store) = memory_state();
    let resp = send(&state, request(Method::POST, "/analytics/journey", "{}", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["recorded"], json!(true));

    let failing = state_with(Arc::new(FailingStore), None);
    let body = json!({ "event": "cta_click", "page": "/" }).to_string();
    let resp = send(&failing, request(Method::POST, "/analytics/journey", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["recorded"], json!(false));
}

#[tokio::test]
async fn test_journey_unparseable_body_is_500() {
    let (state, _store) = memory_state();
    let resp = send(&state, request(Method::POST, "/analytics/journey", "<html>", None)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Admin session
// ============================================================================

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (state, _store) = memory_state();

    let body = json!({ "email": ADMIN_EMAIL, "password": "wrong" }).to_string();
    let resp = send(&state, request(Method::POST, "/auth", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(cookie_pair(&resp, "admin_session").is_none());

    let body = json!({ "email": ADMIN_EMAIL }).to_string();
    let resp = send(&state, request(Method::POST, "/auth", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_status_logout() {
    let (state, _store) = memory_state();
    let session = login(&state).await;

    let resp = send(&state, request(Method::GET, "/auth", "", Some(&session))).await;
    let status = body_json(resp).await;
    assert_eq!(status["authenticated"], json!(true));
    assert_eq!(status["email"], json!(ADMIN_EMAIL));

    let resp = send(&state, request(Method::GET, "/auth", "", None)).await;
    assert_eq!(body_json(resp).await, json!({ "authenticated": false }));

    let resp = send(&state, request(Method::DELETE, "/auth", "", Some(&session))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(cookie_pair(&resp, "admin_session").as_deref(), Some("admin_session="));
}

#[tokio::test]
async fn test_login_not_configured() {
    let store: Arc<dyn LeadStore> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(test_args(false), store, None).unwrap());

    let body = json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }).to_string();
    let resp = send(&state, request(Method::POST, "/auth", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

    let resp = send(&state, request(Method::GET, "/admin/leads/export", "", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_export_requires_session() {
    let (state, _store) = memory_state();

    let resp = send(&state, request(Method::GET, "/admin/leads/export", "", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({ "error": "Unauthorized" }));

    let forged = "admin_session=eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl";
    let resp = send(&state, request(Method::GET, "/admin/leads/export", "", Some(forged))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&state, request(Method::GET, "/admin/leads", "", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Lead capture and export
// ============================================================================

#[tokio::test]
async fn test_empty_export_is_header_only() {
    let (state, _store) = memory_state();
    let session = login(&state).await;

    let resp = send(&state, request(Method::GET, "/admin/leads/export", "", Some(&session))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[CONTENT_TYPE], "text/csv; charset=utf-8");
    let csv = body_text(resp).await;
    assert_eq!(csv.lines().count(), 1);
    assert!(csv.starts_with("\"Email\",\"Name\""));
}

#[tokio::test]
async fn test_contact_round_trips_through_export() {
    let (state, store) = memory_state();

    let body = json!({
        "name": "Jane Doe",
        "email": "jane@acme.example",
        "company": "Acme \"Growth\" Co",
        "website": "https://acme.example",
        "phone": "555-0100",
        "message": "Can we talk next week?",
        "page": "/contact",
    })
    .to_string();
    let resp = send(&state, request(Method::POST, "/contact", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let lead_id = body_json(resp).await["lead_id"].as_str().unwrap().to_string();

    let activities = store.activities_for(&lead_id);
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].activity_type, "contact_form_submitted");

    // A visitor placeholder must not show up in the export
    let beacon = json!({ "event": "page_view", "page": "/" }).to_string();
    send(&state, request(Method::POST, "/analytics", &beacon, None)).await;

    let session = login(&state).await;
    let resp = send(&state, request(Method::GET, "/admin/leads/export", "", Some(&session))).await;
    let csv = body_text(resp).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with(
        "\"jane@acme.example\",\"Jane Doe\",\"Acme \"\"Growth\"\" Co\",\"https://acme.example\",\"555-0100\",20,0,\"contact_form\",\"\","
    ));

    let resp = send(&state, request(Method::GET, "/admin/leads", "", Some(&session))).await;
    let list = body_json(resp).await;
    assert_eq!(list["total"], json!(1));
    assert_eq!(list["leads"][0]["leadId"], json!(lead_id));
}

#[tokio::test]
async fn test_contact_validation() {
    let (state, store) = memory_state();

    let resp = send(&state, request(Method::POST, "/contact", &json!({ "name": "Jane" }).to_string(), None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = json!({ "name": "Jane", "email": "not-an-email" }).to_string();
    let resp = send(&state, request(Method::POST, "/contact", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({ "error": "Invalid email address" }));

    assert_eq!(store.leads_len(), 0);
}

#[tokio::test]
async fn test_assessment_scores_narrates_and_persists() {
    let store = Arc::new(MemoryStore::new());
    let llm = Arc::new(MockBackend::new("mock-narrator").with_response(
        json!({
            "summary": "Solid foundations with room to convert more visitors.",
            "insights": ["SEO is carrying your traffic"],
            "next_steps": ["Install conversion tracking"],
        })
        .to_string(),
    ));
    let state = state_with(store.clone(), Some(llm.clone()));

    let body = json!({
        "email": "Sam@Acme.example",
        "name": "Sam",
        "company": "Acme",
        "answers": questionnaire(),
    })
    .to_string();
    let resp = send(&state, request(Method::POST, "/assessment", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result = body_json(resp).await;

    assert_eq!(llm.call_count(), 1);
    assert_eq!(result["narrative_status"], json!("generated"));
    assert_eq!(result["narrative"]["insights"][0], json!("SEO is carrying your traffic"));

    let score = result["report"]["score"].as_u64().unwrap();
    let subscores = &result["report"]["subscores"];
    let sum: u64 = subscores
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(score, sum);
    assert!(score <= 100);
    assert_eq!(result["report"]["plan"].as_array().unwrap().len(), 3);

    let assessment_id = result["assessment_id"].as_str().unwrap();
    let resp = send(&state, request(Method::GET, &format!("/assessment/{}", assessment_id), "", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let stored = body_json(resp).await;
    assert_eq!(stored["report"], result["report"]);
    assert!(stored.get("answers").is_none());

    let session = login(&state).await;
    let resp = send(&state, request(Method::GET, "/admin/leads/export", "", Some(&session))).await;
    let csv = body_text(resp).await;
    let row = csv.lines().nth(1).unwrap();
    assert!(row.starts_with("\"sam@acme.example\",\"Sam\",\"Acme\",\"https://acme.example\""));
    assert!(row.contains(&format!(",{},1,\"assessment\",", score)));
}

#[tokio::test]
async fn test_assessment_survives_narrative_failure() {
    let store = Arc::new(MemoryStore::new());
    let llm = Arc::new(MockBackend::new("mock").with_response("I'd rather not answer in JSON."));
    let state = state_with(store, Some(llm));

    let body = json!({ "email": "sam@acme.example", "answers": questionnaire() }).to_string();
    let resp = send(&state, request(Method::POST, "/assessment", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result = body_json(resp).await;
    assert_eq!(result["narrative_status"], json!("failed"));
    assert!(result["narrative"].is_null());
    assert!(result["report"]["score"].is_u64());
}

#[tokio::test]
async fn test_assessment_accepts_unanswered_questions() {
    let (state, _store) = memory_state();

    let submit = |answers: Value| {
        json!({ "email": "sam@acme.example", "answers": answers }).to_string()
    };

    let resp = send(&state, request(Method::POST, "/assessment", &submit(json!({})), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let baseline = body_json(resp).await["report"]["score"].clone();

    for answers in [
        json!({ "budget": null, "lead_gen_methods": null }),
        json!({ "monthly_visitors": 5000 }),
        json!({ "lead_gen_methods": [42, null], "website_url": false }),
    ] {
        let resp = send(&state, request(Method::POST, "/assessment", &submit(answers), None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["report"]["score"], baseline);
    }
}

#[tokio::test]
async fn test_assessment_unknown_tool_and_id() {
    let (state, _store) = memory_state();

    let body = json!({
        "email": "sam@acme.example",
        "tool_id": "retired-quiz",
        "answers": questionnaire(),
    })
    .to_string();
    let resp = send(&state, request(Method::POST, "/assessment", &body, None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({ "error": "Unknown assessment tool" }));

    let resp = send(&state, request(Method::GET, "/assessment/does-not-exist", "", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Misc
// ============================================================================

#[tokio::test]
async fn test_tools_listing() {
    let (state, _store) = memory_state();
    let resp = send(&state, request(Method::GET, "/tools", "", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let tools = body_json(resp).await;
    assert_eq!(tools["tools"][0]["id"], json!("growth-assessment"));
}

#[tokio::test]
async fn test_unknown_routes_and_methods() {
    let (state, _store) = memory_state();

    let resp = send(&state, request(Method::GET, "/wp-admin", "", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({ "error": "Not found" }));

    let resp = send(&state, request(Method::GET, "/analytics", "", None)).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_preflight_and_cors() {
    let (state, _store) = memory_state();
    let resp = send(&state, request(Method::OPTIONS, "/contact", "", None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers()["access-control-allow-origin"],
        "https://consultancy.example"
    );
    assert_eq!(resp.headers()["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn test_health_reports_degraded_store() {
    let (state, _store) = memory_state();
    let resp = send(&state, request(Method::GET, "/health", "", None)).await;
    let health = body_json(resp).await;
    assert_eq!(health["status"], json!("online"));
    assert_eq!(health["store"]["backend"], json!("memory"));

    let failing = state_with(Arc::new(FailingStore), None);
    let resp = send(&failing, request(Method::GET, "/healthz", "", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let health = body_json(resp).await;
    assert_eq!(health["status"], json!("degraded"));
    assert_eq!(health["store"]["reachable"], json!(false));
}
