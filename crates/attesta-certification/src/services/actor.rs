//! Actor resolution.
//!
//! Determines whether a viewer counts as the actor behind a recorded
//! decision or delegation. Actors are retained for auditing when work is
//! forwarded, so a viewer who inherited a reassigned work item also
//! inherits authorship of decisions made before the reassignment ("buck
//! passing"). Resolution over the owner-history log is a plain linear scan.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{Certification, Identity, WorkItem, WorkItemMonitor};

/// Trait for identity directory backends.
#[async_trait::async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look up an identity by login name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Identity>>;
}

/// In-memory identity directory for testing.
#[derive(Debug, Default)]
pub struct InMemoryIdentityDirectory {
    identities: Arc<RwLock<HashMap<String, Identity>>>,
}

impl InMemoryIdentityDirectory {
    /// Create a new in-memory directory.
    pub fn new() -> Self {
        Self {
            identities: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add an identity.
    pub async fn insert(&self, identity: Identity) {
        self.identities
            .write()
            .await
            .insert(identity.name.clone(), identity);
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.identities.write().await.clear();
    }

    /// Get identity count.
    pub async fn count(&self) -> usize {
        self.identities.read().await.len()
    }
}

#[async_trait::async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<Identity>> {
        Ok(self.identities.read().await.get(name).cloned())
    }
}

/// Resolves whether a viewer is the actor behind a work-item monitor.
pub struct ActorResolver {
    directory: Arc<dyn IdentityDirectory>,
}

impl ActorResolver {
    /// Create a new resolver backed by the given directory.
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory }
    }

    /// Whether `viewer` is the actor of `monitor`, directly or through a
    /// reassigned work item. A missing monitor resolves to `false`.
    pub async fn is_actor(
        &self,
        viewer: &Identity,
        monitor: Option<&dyn WorkItemMonitor>,
        certification: &Certification,
    ) -> Result<bool> {
        let Some(monitor) = monitor else {
            return Ok(false);
        };
        let Some(actor_name) = monitor.actor_name() else {
            return Ok(false);
        };

        if actor_name == viewer.name {
            return Ok(true);
        }

        self.has_buck_been_passed(viewer, actor_name, monitor, certification)
            .await
    }

    /// Whether the monitor was acted upon in a work item now owned by the
    /// viewer, with the original actor in its owner history.
    async fn has_buck_been_passed(
        &self,
        viewer: &Identity,
        actor_name: &str,
        monitor: &dyn WorkItemMonitor,
        certification: &Certification,
    ) -> Result<bool> {
        // Owner histories record display names, so the original actor has
        // to be resolved. An actor missing from the directory resolves
        // conservatively to false.
        let Some(actor) = self.directory.find_by_name(actor_name).await? else {
            return Ok(false);
        };

        // No acting work item means the act was done in the certification;
        // any of its work items may have carried the work since. A dangling
        // acting-work-item ID leaves nothing to scan.
        let candidates: Vec<&WorkItem> = match monitor.acting_work_item() {
            Some(id) => certification.find_work_item(id).into_iter().collect(),
            None => certification.work_items.iter().collect(),
        };

        Ok(candidates.iter().any(|wi| {
            wi.owner_name == viewer.name && wi.was_previous_owner(&actor.display_name)
        }))
    }
}
