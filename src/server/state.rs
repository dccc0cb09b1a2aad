//! Shared application state

use std::sync::Arc;
use std::time::Instant;

use crate::auth::{AdminCredentials, SessionGuard, VisitorTokens};
use crate::config::Args;
use crate::db::LeadStore;
use crate::llm::LlmBackend;
use crate::tools::ToolCatalog;
use crate::types::LeadwayError;

/// State shared by every request. Immutable after startup.
pub struct AppState {
    pub args: Args,
    /// Persistence gateway
    pub store: Arc<dyn LeadStore>,
    /// Narrative backend; `None` runs scoring without narratives
    pub llm: Option<Arc<dyn LlmBackend>>,
    pub sessions: SessionGuard,
    pub visitors: VisitorTokens,
    /// `None` when operator login is not configured
    pub admin: Option<AdminCredentials>,
    pub tools: ToolCatalog,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration and injected dependencies
    pub fn new(
        args: Args,
        store: Arc<dyn LeadStore>,
        llm: Option<Arc<dyn LlmBackend>>,
    ) -> Result<Self, LeadwayError> {
        let secret = args
            .session_secret()
            .ok_or_else(|| LeadwayError::Config("SESSION_SECRET is not set".into()))?;

        let admin = AdminCredentials::from_args(&args)?;
        let sessions = SessionGuard::new(
            secret.as_bytes(),
            admin.as_ref().map(AdminCredentials::email),
            args.session_window_ms(),
        );
        let visitors = VisitorTokens::new(secret.as_bytes());

        let tools = match &args.tools_file {
            Some(path) => ToolCatalog::load(path)?,
            None => ToolCatalog::builtin(),
        };

        Ok(Self {
            args,
            store,
            llm,
            sessions,
            visitors,
            admin,
            tools,
            started_at: Instant::now(),
        })
    }
}
