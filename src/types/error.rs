//! Error types for Leadway
//!
//! Client errors carry their fixed message back to the caller. Dependency
//! failures are logged in full and surfaced as an opaque 500.

use hyper::StatusCode;

/// Main error type for Leadway operations
#[derive(Debug, thiserror::Error)]
pub enum LeadwayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl LeadwayError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Whether the caller caused this error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Message safe to return to the caller.
    ///
    /// Server-side failures collapse to a generic string; the detail stays
    /// in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::NotFound(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Auth(msg) => msg.clone(),
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl From<std::io::Error> for LeadwayError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for LeadwayError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for LeadwayError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for LeadwayError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for LeadwayError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Database(format!("BSON encoding failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for LeadwayError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Auth(format!("Token error: {}", err))
    }
}

/// Result type alias for Leadway operations
pub type Result<T> = std::result::Result<T, LeadwayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_message() {
        let err = LeadwayError::BadRequest("Missing required fields".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
        assert_eq!(err.public_message(), "Missing required fields");
    }

    #[test]
    fn test_server_errors_are_opaque() {
        let err = LeadwayError::Database("connection refused at 10.0.0.4".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_client_error());
        assert_eq!(err.public_message(), "Internal server error");
    }
}
