//! HTTP server for Leadway

pub mod http;
mod state;

pub use http::run;
pub use state::AppState;
