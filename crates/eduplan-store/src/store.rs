//! The persistence seam between the HTTP layer and whatever keeps records.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use eduplan_core::DocumentKind;

use crate::models::{NewRecord, StoredRecord};

/// Record storage, scoped per [`DocumentKind`].
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persist `record`, assigning its id and creation time.
    async fn insert(&self, record: NewRecord) -> Result<StoredRecord>;

    /// A user's records of one kind, newest first.
    async fn list_for_user(&self, kind: DocumentKind, user_id: &str) -> Result<Vec<StoredRecord>>;

    async fn get(&self, kind: DocumentKind, id: Uuid) -> Result<Option<StoredRecord>>;

    /// Returns `false` when no such record existed.
    async fn delete(&self, kind: DocumentKind, id: Uuid) -> Result<bool>;
}

// Compile-time assertion: ContentStore must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ContentStore) {}
};
