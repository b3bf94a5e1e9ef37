//! Storage and refresh seams.
//!
//! The engine never touches persistence directly; it loads snapshots and
//! writes state changes through [`CertificationStore`], and notifies the
//! surrounding refresh machinery through [`RefreshSink`]. The in-memory
//! implementations back the test suites.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{CertificationError, Result};
use crate::types::{
    Certification, CertificationEntity, CertificationId, CertificationItem, EntityId, ItemId,
};

/// Trait for certification storage backends.
#[async_trait::async_trait]
pub trait CertificationStore: Send + Sync {
    /// Get a certification by ID.
    async fn get_certification(&self, id: CertificationId) -> Result<Option<Certification>>;

    /// Get an entity by ID.
    async fn get_entity(&self, id: EntityId) -> Result<Option<CertificationEntity>>;

    /// Get an item by ID.
    async fn get_item(&self, id: ItemId) -> Result<Option<CertificationItem>>;

    /// List all items belonging to an entity.
    async fn list_items_for_entity(&self, entity_id: EntityId) -> Result<Vec<CertificationItem>>;

    /// Persist an updated item.
    async fn save_item(&self, item: &CertificationItem) -> Result<()>;

    /// Persist an updated entity.
    async fn save_entity(&self, entity: &CertificationEntity) -> Result<()>;

    /// Sign off a certification.
    ///
    /// Fails with [`CertificationError::Locked`] when another request holds
    /// the certification lock.
    async fn sign(&self, id: CertificationId, signer_name: &str) -> Result<Certification>;
}

/// Trait for the refresh machinery notified after each state change.
#[async_trait::async_trait]
pub trait RefreshSink: Send + Sync {
    /// Mark an item as needing a refresh pass.
    async fn mark_for_refresh(&self, item_id: ItemId) -> Result<()>;

    /// Run a refresh over the certification, returning user-facing
    /// warning messages.
    async fn refresh(&self, certification_id: CertificationId) -> Result<Vec<String>>;
}

/// In-memory certification store for testing.
#[derive(Debug, Default)]
pub struct InMemoryCertificationStore {
    certifications: Arc<RwLock<HashMap<CertificationId, Certification>>>,
    entities: Arc<RwLock<HashMap<EntityId, CertificationEntity>>>,
    items: Arc<RwLock<HashMap<ItemId, CertificationItem>>>,
    item_writes: Arc<RwLock<u64>>,
    sign_lock: Arc<RwLock<Option<Vec<String>>>>,
}

impl InMemoryCertificationStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a certification.
    pub async fn insert_certification(&self, certification: Certification) {
        self.certifications
            .write()
            .await
            .insert(certification.id, certification);
    }

    /// Add an entity.
    pub async fn insert_entity(&self, entity: CertificationEntity) {
        self.entities.write().await.insert(entity.id, entity);
    }

    /// Add an item.
    pub async fn insert_item(&self, item: CertificationItem) {
        self.items.write().await.insert(item.id, item);
    }

    /// Number of item writes performed through [`CertificationStore::save_item`].
    pub async fn item_write_count(&self) -> u64 {
        *self.item_writes.read().await
    }

    /// Make the next sign attempt fail as concurrently locked, carrying
    /// the given messages.
    pub async fn fail_next_sign_with_lock(&self, messages: Vec<String>) {
        *self.sign_lock.write().await = Some(messages);
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.certifications.write().await.clear();
        self.entities.write().await.clear();
        self.items.write().await.clear();
        *self.item_writes.write().await = 0;
        *self.sign_lock.write().await = None;
    }
}

#[async_trait::async_trait]
impl CertificationStore for InMemoryCertificationStore {
    async fn get_certification(&self, id: CertificationId) -> Result<Option<Certification>> {
        Ok(self.certifications.read().await.get(&id).cloned())
    }

    async fn get_entity(&self, id: EntityId) -> Result<Option<CertificationEntity>> {
        Ok(self.entities.read().await.get(&id).cloned())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<CertificationItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn list_items_for_entity(&self, entity_id: EntityId) -> Result<Vec<CertificationItem>> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|i| i.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn save_item(&self, item: &CertificationItem) -> Result<()> {
        self.items.write().await.insert(item.id, item.clone());
        *self.item_writes.write().await += 1;
        Ok(())
    }

    async fn save_entity(&self, entity: &CertificationEntity) -> Result<()> {
        self.entities.write().await.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn sign(&self, id: CertificationId, _signer_name: &str) -> Result<Certification> {
        if let Some(messages) = self.sign_lock.write().await.take() {
            return Err(CertificationError::Locked { messages });
        }

        let mut certifications = self.certifications.write().await;
        let certification = certifications
            .get_mut(&id)
            .ok_or(CertificationError::CertificationNotFound(id))?;
        certification.signed = Some(Utc::now());
        Ok(certification.clone())
    }
}

/// In-memory refresh sink for testing. Records which items were marked.
#[derive(Debug, Default)]
pub struct InMemoryRefreshSink {
    marked: Arc<RwLock<Vec<ItemId>>>,
}

impl InMemoryRefreshSink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items marked for refresh, in order.
    pub async fn marked(&self) -> Vec<ItemId> {
        self.marked.read().await.clone()
    }

    /// Get mark count.
    pub async fn count(&self) -> usize {
        self.marked.read().await.len()
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.marked.write().await.clear();
    }
}

#[async_trait::async_trait]
impl RefreshSink for InMemoryRefreshSink {
    async fn mark_for_refresh(&self, item_id: ItemId) -> Result<()> {
        self.marked.write().await.push(item_id);
        Ok(())
    }

    async fn refresh(&self, _certification_id: CertificationId) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CertificationDefinition, CertificationPhase, CertificationType, EntitlementGranularity,
    };

    fn certification() -> Certification {
        Certification {
            id: CertificationId::new(),
            name: "review".to_string(),
            certification_type: CertificationType::Manager,
            certifiers: vec!["amy".to_string()],
            phase: CertificationPhase::Active,
            signed: None,
            work_items: Vec::new(),
            entitlement_granularity: EntitlementGranularity::Value,
            enabled_phases: vec![CertificationPhase::Active],
            process_revokes_immediately: false,
            reassignment_parent_certifiers: Vec::new(),
            definition: CertificationDefinition::default(),
        }
    }

    #[tokio::test]
    async fn test_sign_sets_timestamp() {
        let store = InMemoryCertificationStore::new();
        let cert = certification();
        let id = cert.id;
        store.insert_certification(cert).await;

        let signed = store.sign(id, "amy").await.unwrap();
        assert!(signed.has_been_signed());
    }

    #[tokio::test]
    async fn test_sign_lock_fires_once() {
        let store = InMemoryCertificationStore::new();
        let cert = certification();
        let id = cert.id;
        store.insert_certification(cert).await;
        store
            .fail_next_sign_with_lock(vec!["someone else is signing".to_string()])
            .await;

        let err = store.sign(id, "amy").await.unwrap_err();
        assert!(matches!(err, CertificationError::Locked { .. }));

        // The lock is released for the next attempt.
        assert!(store.sign(id, "amy").await.is_ok());
    }

    #[tokio::test]
    async fn test_item_write_counter() {
        let store = InMemoryCertificationStore::new();
        let cert = certification();
        let entity = CertificationEntity {
            id: EntityId::new(),
            certification_id: cert.id,
            entity_type: crate::types::EntityType::Identity,
            target_name: "victor".to_string(),
            delegation: None,
        };
        let item = CertificationItem {
            id: ItemId::new(),
            entity_id: entity.id,
            certification_id: cert.id,
            item_type: crate::types::ItemType::Exception,
            phase: None,
            action: None,
            delegation: None,
            challenge: None,
            exception_application: None,
            exception_account: None,
        };

        store.save_item(&item).await.unwrap();
        store.save_item(&item).await.unwrap();
        assert_eq!(store.item_write_count().await, 2);
    }
}
