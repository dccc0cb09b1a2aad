//! Leadway - lead capture backend for a consultancy marketing site
//!
//! Leadway takes contact forms, analytics beacons and self-assessment
//! questionnaires from the public site, scores assessments, and gives the
//! operator a session-guarded CSV export of the resulting leads.
//!
//! ## Services
//!
//! - **Intake**: validation of untyped JSON bodies
//! - **Scoring**: deterministic lead scoring with optional LLM narrative
//! - **Store**: MongoDB persistence gateway with an in-memory stand-in
//! - **Auth**: signed admin session and anonymous visitor tokens

pub mod auth;
pub mod config;
pub mod db;
pub mod export;
pub mod intake;
pub mod llm;
pub mod routes;
pub mod scoring;
pub mod server;
pub mod tools;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{LeadwayError, Result};
