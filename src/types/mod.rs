//! Shared types for Leadway

pub mod error;

pub use error::{LeadwayError, Result};
