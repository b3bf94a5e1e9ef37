//! Shared harness for integration tests.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use attesta_certification::{
    Certification, CertificationEntity, CertificationId, CertificationItem, CertificationStore,
    DecisionService, EntityId, Identity, InMemoryAuditStore, InMemoryCertificationStore,
    InMemoryIdentityDirectory, InMemoryRefreshSink, ItemId, RoleService,
};

/// Everything a test needs: the in-memory seams and the services wired to
/// them.
pub struct TestHarness {
    pub store: Arc<InMemoryCertificationStore>,
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub audit: Arc<InMemoryAuditStore>,
    pub refresh: Arc<InMemoryRefreshSink>,
    pub decisions: DecisionService,
    pub roles: RoleService,
}

impl TestHarness {
    /// Build a harness with empty stores.
    pub fn new() -> Self {
        let store = Arc::new(InMemoryCertificationStore::new());
        let directory = Arc::new(InMemoryIdentityDirectory::new());
        let audit = Arc::new(InMemoryAuditStore::new());
        let refresh = Arc::new(InMemoryRefreshSink::new());

        let decisions = DecisionService::new(
            store.clone(),
            directory.clone(),
            audit.clone(),
            refresh.clone(),
        );
        let roles = RoleService::new(directory.clone());

        Self {
            store,
            directory,
            audit,
            refresh,
            decisions,
            roles,
        }
    }

    /// Seed the directory with the stock identities.
    pub async fn seed_identities(&self, identities: &[Identity]) {
        for identity in identities {
            self.directory.insert(identity.clone()).await;
        }
    }

    /// Seed one certification graph.
    pub async fn seed_graph(
        &self,
        certification: &Certification,
        entity: &CertificationEntity,
        items: &[CertificationItem],
    ) {
        self.store.insert_certification(certification.clone()).await;
        self.store.insert_entity(entity.clone()).await;
        for item in items {
            self.store.insert_item(item.clone()).await;
        }
    }

    /// Reload an item, panicking when it is gone.
    pub async fn item(&self, id: ItemId) -> CertificationItem {
        self.store
            .get_item(id)
            .await
            .expect("store error")
            .unwrap_or_else(|| panic!("item '{id}' not found in store"))
    }

    /// Reload an entity, panicking when it is gone.
    pub async fn entity(&self, id: EntityId) -> CertificationEntity {
        self.store
            .get_entity(id)
            .await
            .expect("store error")
            .unwrap_or_else(|| panic!("entity '{id}' not found in store"))
    }

    /// Reload a certification, panicking when it is gone.
    pub async fn certification(&self, id: CertificationId) -> Certification {
        self.store
            .get_certification(id)
            .await
            .expect("store error")
            .unwrap_or_else(|| panic!("certification '{id}' not found in store"))
    }

    /// Audit event count, as the persistence-write probe.
    pub async fn audit_count(&self) -> usize {
        self.audit.count().await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
