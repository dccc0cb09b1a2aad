//! Anonymous visitor identity
//!
//! Anonymous tracking keys a placeholder lead by a random id minted on the
//! first tracked request and signed into the `visitor` cookie. A missing or
//! tampered cookie mints a fresh id.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::cookie::read_cookie;
use crate::types::LeadwayError;

/// Cookie carrying the signed visitor id
pub const VISITOR_COOKIE: &str = "visitor";

/// Visitor cookies live for a year
pub const VISITOR_COOKIE_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

const TOKEN_TYPE: &str = "visitor";

#[derive(Debug, Serialize, Deserialize)]
struct VisitorClaims {
    vid: String,
    typ: String,
}

/// Resolved visitor for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorIdentity {
    pub visitor_id: String,
    /// Token to set on the response when the id was minted for this request
    pub new_token: Option<String>,
}

/// Mints and verifies visitor tokens
#[derive(Clone)]
pub struct VisitorTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl VisitorTokens {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a visitor id
    pub fn sign(&self, visitor_id: &str) -> Result<String, LeadwayError> {
        let claims = VisitorClaims {
            vid: visitor_id.to_string(),
            typ: TOKEN_TYPE.to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify a token and return the visitor id it carries
    pub fn verify(&self, token: &str) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<VisitorClaims>(token, &self.decoding, &validation)
            .ok()
            .filter(|data| data.claims.typ == TOKEN_TYPE && !data.claims.vid.is_empty())
            .map(|data| data.claims.vid)
    }

    /// Resolve the visitor from the request cookies, minting a new id if needed
    pub fn resolve(&self, headers: &hyper::HeaderMap) -> Result<VisitorIdentity, LeadwayError> {
        if let Some(visitor_id) = read_cookie(headers, VISITOR_COOKIE).and_then(|t| self.verify(t)) {
            return Ok(VisitorIdentity {
                visitor_id,
                new_token: None,
            });
        }

        let visitor_id = Uuid::new_v4().to_string();
        let token = self.sign(&visitor_id)?;
        Ok(VisitorIdentity {
            visitor_id,
            new_token: Some(token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{HeaderValue, COOKIE};

    #[test]
    fn test_mint_then_resolve_same_visitor() {
        let tokens = VisitorTokens::new(b"visitor-secret");
        let first = tokens.resolve(&hyper::HeaderMap::new()).unwrap();
        let token = first.new_token.clone().unwrap();

        let mut headers = hyper::HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("visitor={}", token)).unwrap(),
        );
        let second = tokens.resolve(&headers).unwrap();
        assert_eq!(second.visitor_id, first.visitor_id);
        assert!(second.new_token.is_none());
    }

    #[test]
    fn test_tampered_token_mints_new_identity() {
        let tokens = VisitorTokens::new(b"visitor-secret");
        let foreign = VisitorTokens::new(b"someone-else").sign("chosen-id").unwrap();
        assert!(tokens.verify(&foreign).is_none());

        let mut headers = hyper::HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("visitor={}", foreign)).unwrap(),
        );
        let identity = tokens.resolve(&headers).unwrap();
        assert_ne!(identity.visitor_id, "chosen-id");
        assert!(identity.new_token.is_some());
    }
}
