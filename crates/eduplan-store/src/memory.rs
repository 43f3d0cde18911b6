//! In-process [`ContentStore`] backed by a `tokio::sync::RwLock`.

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use eduplan_core::DocumentKind;

use crate::models::{NewRecord, StoredRecord};
use crate::store::ContentStore;

/// Records kept in insertion order, which is also creation order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert(&self, record: NewRecord) -> Result<StoredRecord> {
        if record.user_id.trim().is_empty() {
            bail!("cannot store a {} record without a user id", record.kind);
        }

        let mut records = self.records.write().await;
        // Taken under the write lock so creation times never go backwards
        // relative to insertion order.
        let stored = StoredRecord::from_new(record, Uuid::new_v4(), Utc::now());
        records.push(stored.clone());

        tracing::debug!(id = %stored.id, kind = %stored.kind, user = %stored.user_id, "record stored");
        Ok(stored)
    }

    async fn list_for_user(&self, kind: DocumentKind, user_id: &str) -> Result<Vec<StoredRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.kind == kind && r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, kind: DocumentKind, id: Uuid) -> Result<Option<StoredRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.kind == kind && r.id == id)
            .cloned())
    }

    async fn delete(&self, kind: DocumentKind, id: Uuid) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !(r.kind == kind && r.id == id));
        let removed = records.len() != before;
        if removed {
            tracing::debug!(%id, %kind, "record deleted");
        }
        Ok(removed)
    }
}
