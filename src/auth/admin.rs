//! Operator credentials

use tracing::info;

use crate::auth::password::{hash_password, validate_hash, verify_password};
use crate::config::Args;
use crate::db::normalize_email;
use crate::types::LeadwayError;

/// The single statically configured operator
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    email: String,
    password_hash: String,
}

impl AdminCredentials {
    pub fn new(email: &str, password_hash: String) -> Result<Self, LeadwayError> {
        validate_hash(&password_hash)?;
        Ok(Self {
            email: normalize_email(email),
            password_hash,
        })
    }

    /// Build from configuration; `None` when operator login is not configured
    pub fn from_args(args: &Args) -> Result<Option<Self>, LeadwayError> {
        let Some(email) = args.admin_email.as_deref() else {
            return Ok(None);
        };

        let hash = match (&args.admin_password_hash, &args.admin_password) {
            (Some(hash), _) => hash.clone(),
            (None, Some(password)) => {
                info!("Hashing ADMIN_PASSWORD for this process");
                hash_password(password)?
            }
            (None, None) => return Ok(None),
        };

        Self::new(email, hash).map(Some)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Check submitted credentials; the email comparison ignores case
    pub fn verify(&self, email: &str, password: &str) -> Result<bool, LeadwayError> {
        let password_ok = verify_password(password, &self.password_hash)?;
        Ok(password_ok && normalize_email(email) == self.email)
    }
}
