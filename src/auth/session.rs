//! Admin session guard
//!
//! An operator session is an HS256-signed token carried in the
//! `admin_session` cookie. Nothing is stored server-side: a request is
//! authenticated when the token verifies, names the configured admin email,
//! and was issued no more than one session window ago.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::auth::cookie::read_cookie;
use crate::db::normalize_email;
use crate::types::LeadwayError;

/// Cookie carrying the admin session token
pub const SESSION_COOKIE: &str = "admin_session";

/// Default session window: 24 hours
pub const DEFAULT_SESSION_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

const TOKEN_TYPE: &str = "admin_session";

/// Claims signed into the session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Operator email
    pub sub: String,
    /// Issue time, epoch milliseconds
    pub iat_ms: i64,
    /// Expiry, epoch seconds (informational; the window check uses `iat_ms`)
    pub exp: i64,
    /// Token type discriminator
    pub typ: String,
}

/// Why a request is not authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No session cookie present
    Missing,
    /// Signature, encoding or token type did not check out
    Invalid,
    /// Token is authentic but names someone other than the admin
    WrongIdentity,
    /// Token is older than the session window
    Expired,
    /// Token claims to be issued after `now`
    IssuedInFuture,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Missing => write!(f, "missing"),
            Rejection::Invalid => write!(f, "invalid"),
            Rejection::WrongIdentity => write!(f, "wrong_identity"),
            Rejection::Expired => write!(f, "expired"),
            Rejection::IssuedInFuture => write!(f, "issued_in_future"),
        }
    }
}

/// Outcome of a session check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated { email: String, issued_at_ms: i64 },
    Unauthenticated(Rejection),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// Issues and checks admin session tokens
#[derive(Clone)]
pub struct SessionGuard {
    encoding: EncodingKey,
    decoding: DecodingKey,
    admin_email: Option<String>,
    window_ms: i64,
}

impl SessionGuard {
    /// Create a guard for `admin_email`; `None` means no session can ever authenticate
    pub fn new(secret: &[u8], admin_email: Option<&str>, window_ms: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            admin_email: admin_email.map(normalize_email),
            window_ms,
        }
    }

    /// Session window in milliseconds
    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Issue a session token for the admin, stamped at `now_ms`
    pub fn issue(&self, now_ms: i64) -> Result<String, LeadwayError> {
        let email = self
            .admin_email
            .clone()
            .ok_or_else(|| LeadwayError::Config("Admin email not configured".into()))?;

        let claims = SessionClaims {
            sub: email,
            iat_ms: now_ms,
            exp: now_ms.saturating_add(self.window_ms) / 1000,
            typ: TOKEN_TYPE.to_string(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Check a raw token value at `now_ms`
    pub fn check(&self, token: &str, now_ms: i64) -> SessionState {
        let claims = match self.decode(token) {
            Some(claims) => claims,
            None => return SessionState::Unauthenticated(Rejection::Invalid),
        };

        match &self.admin_email {
            Some(admin) if normalize_email(&claims.sub) == *admin => {}
            _ => return SessionState::Unauthenticated(Rejection::WrongIdentity),
        }

        if claims.iat_ms > now_ms {
            return SessionState::Unauthenticated(Rejection::IssuedInFuture);
        }

        if now_ms - claims.iat_ms > self.window_ms {
            return SessionState::Unauthenticated(Rejection::Expired);
        }

        SessionState::Authenticated {
            email: claims.sub,
            issued_at_ms: claims.iat_ms,
        }
    }

    /// Check the session cookie on a request
    pub fn check_headers(&self, headers: &hyper::HeaderMap, now_ms: i64) -> SessionState {
        match read_cookie(headers, SESSION_COOKIE) {
            Some(token) => self.check(token, now_ms),
            None => SessionState::Unauthenticated(Rejection::Missing),
        }
    }

    fn decode(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) if data.claims.typ == TOKEN_TYPE => Some(data.claims),
            Ok(_) => {
                debug!("Session token has wrong type");
                None
            }
            Err(e) => {
                debug!(error = %e, "Session token rejected");
                None
            }
        }
    }
}
