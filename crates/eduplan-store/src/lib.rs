//! Persistence collaborator for generated documents.
//!
//! Records are keyed by a server-assigned UUID and scoped by document kind,
//! so a curriculum id never resolves under `/clases`.

pub mod memory;
pub mod models;
pub mod store;

pub use memory::MemoryStore;
pub use models::{NewRecord, StoredRecord};
pub use store::ContentStore;
