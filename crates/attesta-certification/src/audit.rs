//! Audit logging for certification decisions.
//!
//! Every state change the engine applies is recorded as a
//! [`DecisionAuditEvent`] through a pluggable [`AuditStore`]. The in-memory
//! store doubles as the test probe for persistence-write counts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{CertificationId, DecisionStatus, ItemId, WorkItemId};

/// Action recorded by a decision audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAuditAction {
    /// An item was approved.
    Approved,
    /// All items on an account were approved.
    ApprovedAccount,
    /// An item was revoked.
    Remediated,
    /// A whole account was revoked.
    RevokedAccount,
    /// An exception was allowed.
    Mitigated,
    /// A violation was acknowledged.
    Acknowledged,
    /// A decision was cleared.
    Cleared,
    /// An item or entity was delegated.
    Delegated,
    /// A delegation was revoked.
    DelegationRevoked,
    /// A delegated decision was reviewed.
    Reviewed,
    /// The certification was signed off.
    Signed,
}

impl std::fmt::Display for DecisionAuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::ApprovedAccount => write!(f, "approved_account"),
            Self::Remediated => write!(f, "remediated"),
            Self::RevokedAccount => write!(f, "revoked_account"),
            Self::Mitigated => write!(f, "mitigated"),
            Self::Acknowledged => write!(f, "acknowledged"),
            Self::Cleared => write!(f, "cleared"),
            Self::Delegated => write!(f, "delegated"),
            Self::DelegationRevoked => write!(f, "delegation_revoked"),
            Self::Reviewed => write!(f, "reviewed"),
            Self::Signed => write!(f, "signed"),
        }
    }
}

/// One recorded decision change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionAuditEvent {
    /// Unique identifier.
    pub id: Uuid,
    /// Certification the change happened in.
    pub certification_id: CertificationId,
    /// Item the change happened on; `None` for certification-level events.
    pub item_id: Option<ItemId>,
    /// What happened.
    pub action: DecisionAuditAction,
    /// Login name of the identity that made the change.
    pub actor_name: String,
    /// Work item the change was made in, if any.
    pub work_item: Option<WorkItemId>,
    /// Displayed status before the change.
    pub previous_status: Option<DecisionStatus>,
    /// Displayed status after the change.
    pub new_status: Option<DecisionStatus>,
    /// Additional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
    /// When the change was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// Input for logging a decision audit event.
#[derive(Debug, Clone)]
pub struct DecisionAuditEventInput {
    /// Certification the change happened in.
    pub certification_id: CertificationId,
    /// Item the change happened on.
    pub item_id: Option<ItemId>,
    /// What happened.
    pub action: DecisionAuditAction,
    /// Login name of the identity that made the change.
    pub actor_name: String,
    /// Work item the change was made in, if any.
    pub work_item: Option<WorkItemId>,
    /// Displayed status before the change.
    pub previous_status: Option<DecisionStatus>,
    /// Displayed status after the change.
    pub new_status: Option<DecisionStatus>,
    /// Additional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

/// Trait for decision audit storage backends.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    /// Record an event.
    async fn log_event(&self, input: DecisionAuditEventInput) -> Result<DecisionAuditEvent>;

    /// List events for an item, oldest first.
    async fn list_for_item(&self, item_id: ItemId) -> Result<Vec<DecisionAuditEvent>>;

    /// List events for a certification, oldest first.
    async fn list_for_certification(
        &self,
        certification_id: CertificationId,
    ) -> Result<Vec<DecisionAuditEvent>>;
}

/// In-memory audit store for testing.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    events: Arc<RwLock<Vec<DecisionAuditEvent>>>,
}

impl InMemoryAuditStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }

    /// Get event count.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn log_event(&self, input: DecisionAuditEventInput) -> Result<DecisionAuditEvent> {
        let event = DecisionAuditEvent {
            id: Uuid::new_v4(),
            certification_id: input.certification_id,
            item_id: input.item_id,
            action: input.action,
            actor_name: input.actor_name,
            work_item: input.work_item,
            previous_status: input.previous_status,
            new_status: input.new_status,
            metadata: input.metadata,
            occurred_at: Utc::now(),
        };
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn list_for_item(&self, item_id: ItemId) -> Result<Vec<DecisionAuditEvent>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.item_id == Some(item_id))
            .cloned()
            .collect())
    }

    async fn list_for_certification(
        &self,
        certification_id: CertificationId,
    ) -> Result<Vec<DecisionAuditEvent>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.certification_id == certification_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(action: DecisionAuditAction, item_id: Option<ItemId>) -> DecisionAuditEventInput {
        DecisionAuditEventInput {
            certification_id: CertificationId::new(),
            item_id,
            action,
            actor_name: "amy".to_string(),
            work_item: None,
            previous_status: None,
            new_status: Some(DecisionStatus::Approved),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_log_and_list_by_item() {
        let store = InMemoryAuditStore::new();
        let item_id = ItemId::new();

        store
            .log_event(input(DecisionAuditAction::Approved, Some(item_id)))
            .await
            .unwrap();
        store
            .log_event(input(DecisionAuditAction::Cleared, Some(ItemId::new())))
            .await
            .unwrap();

        let events = store.list_for_item(item_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, DecisionAuditAction::Approved);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryAuditStore::new();
        store
            .log_event(input(DecisionAuditAction::Signed, None))
            .await
            .unwrap();
        store.clear().await;
        assert_eq!(store.count().await, 0);
    }
}
