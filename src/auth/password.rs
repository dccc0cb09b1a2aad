//! Operator password hashing with Argon2id
//!
//! The operator password arrives through the environment. It is hashed once at
//! startup so the plaintext is never compared directly.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::LeadwayError;

/// Hash a password using Argon2id, returning the PHC string
pub fn hash_password(password: &str) -> Result<String, LeadwayError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LeadwayError::Config(format!("Failed to hash admin password: {e}")))
}

/// Verify a password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, LeadwayError> {
    let parsed = parse_hash(hash)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Check that a configured hash is a well-formed PHC string
pub fn validate_hash(hash: &str) -> Result<(), LeadwayError> {
    parse_hash(hash).map(|_| ())
}

fn parse_hash(hash: &str) -> Result<PasswordHash<'_>, LeadwayError> {
    PasswordHash::new(hash)
        .map_err(|e| LeadwayError::Config(format!("Invalid admin password hash: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("quarterly-pipeline-review").unwrap();
        assert!(hash.starts_with("$argon2id"));
        assert!(verify_password("quarterly-pipeline-review", &hash).unwrap());
        assert!(!verify_password("quarterly-pipeline", &hash).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("password", "plain-text-not-phc").is_err());
        assert!(validate_hash("plain-text-not-phc").is_err());
    }
}
