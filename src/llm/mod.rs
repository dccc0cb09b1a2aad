//! Text-generation backends used for assessment narratives.
//!
//! - OpenAI-compatible hosted API
//! - Mock backend for tests

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, Message};
