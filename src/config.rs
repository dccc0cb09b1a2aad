//! Configuration for Leadway
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Secret used to sign session and visitor tokens when none is configured in dev mode
const DEV_SESSION_SECRET: &str = "dev-only-insecure-secret";

/// Leadway - lead capture, analytics and assessment backend
#[derive(Parser, Debug, Clone)]
#[command(name = "leadway")]
#[command(about = "Lead capture, analytics and assessment backend for the marketing site")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory store fallback, insecure defaults)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "leadway")]
    pub mongodb_db: String,

    /// Operator email allowed to sign in to the admin area
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Operator password (hashed with argon2 at startup, never stored)
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Operator password as an argon2 PHC hash (takes precedence over ADMIN_PASSWORD)
    #[arg(long, env = "ADMIN_PASSWORD_HASH", hide_env_values = true)]
    pub admin_password_hash: Option<String>,

    /// Secret for signing session and visitor tokens (required in production)
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Admin session lifetime in hours
    #[arg(long, env = "SESSION_TTL_HOURS", default_value = "24")]
    pub session_ttl_hours: u64,

    /// Mark cookies as Secure (disable only for local http development)
    #[arg(long, env = "COOKIE_SECURE", default_value = "true", action = clap::ArgAction::Set)]
    pub cookie_secure: bool,

    /// API key for the narrative text-generation service (required in production)
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    pub ai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible text-generation API
    #[arg(long, env = "AI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub ai_base_url: String,

    /// Model used for assessment narratives
    #[arg(long, env = "AI_MODEL", default_value = "gpt-4o-mini")]
    pub ai_model: String,

    /// Maximum tokens requested for a narrative
    #[arg(long, env = "AI_MAX_TOKENS", default_value = "900")]
    pub ai_max_tokens: u32,

    /// Outbound request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "65536")]
    pub max_body_bytes: usize,

    /// JSON file describing the assessment tools (built-in catalog when unset)
    #[arg(long, env = "TOOLS_FILE")]
    pub tools_file: Option<PathBuf>,

    /// Value for Access-Control-Allow-Origin
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    pub cors_origin: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// Get effective signing secret (uses default in dev mode)
    pub fn session_secret(&self) -> Option<String> {
        match &self.session_secret {
            Some(secret) => Some(secret.clone()),
            None if self.dev_mode => Some(DEV_SESSION_SECRET.to_string()),
            None => None,
        }
    }

    /// Admin session window in milliseconds
    pub fn session_window_ms(&self) -> i64 {
        let hours = i64::try_from(self.session_ttl_hours).unwrap_or(i64::MAX / 3_600_000);
        hours.saturating_mul(3_600_000)
    }

    /// Whether operator login is configured at all
    pub fn admin_login_configured(&self) -> bool {
        self.admin_email.is_some()
            && (self.admin_password.is_some() || self.admin_password_hash.is_some())
    }

    /// Whether log lines should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.ai_api_key.as_deref().map_or(true, str::is_empty) {
                return Err("AI_API_KEY is required in production mode".to_string());
            }
            if self.session_secret.is_none() {
                return Err("SESSION_SECRET is required in production mode".to_string());
            }
            if !self.admin_login_configured() {
                return Err(
                    "ADMIN_EMAIL and ADMIN_PASSWORD (or ADMIN_PASSWORD_HASH) are required in production mode"
                        .to_string(),
                );
            }
        }

        if let Some(secret) = &self.session_secret {
            if secret.len() < 32 && !self.dev_mode {
                return Err("SESSION_SECRET must be at least 32 bytes".to_string());
            }
        }

        if self.session_ttl_hours == 0 {
            return Err("SESSION_TTL_HOURS must be greater than zero".to_string());
        }

        if !matches!(self.log_format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err("LOG_FORMAT must be 'text' or 'json'".to_string());
        }

        Ok(())
    }
}
