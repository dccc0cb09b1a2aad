//! Persistence gateway
//!
//! Handlers talk to a [`LeadStore`] trait object. Production runs on
//! MongoDB; dev mode and tests run on the in-memory store.

pub mod memory;
pub mod mongo;
pub mod mongo_store;
pub mod schemas;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::MongoClient;
pub use mongo_store::MongoStore;
pub use store::{normalize_email, sort_newest_first, LeadContact, LeadStore};
