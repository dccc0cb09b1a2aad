//! Authentication for Leadway
//!
//! Provides:
//! - Operator credential checking (argon2 password hashes)
//! - Signed admin session tokens bounded to a time window
//! - Signed anonymous visitor tokens
//! - Cookie parsing and `Set-Cookie` rendering

pub mod admin;
pub mod cookie;
pub mod password;
pub mod session;
pub mod visitor;

pub use admin::AdminCredentials;
pub use cookie::{read_cookie, SetCookie};
pub use password::{hash_password, verify_password};
pub use session::{Rejection, SessionClaims, SessionGuard, SessionState, SESSION_COOKIE};
pub use visitor::{VisitorIdentity, VisitorTokens, VISITOR_COOKIE};
