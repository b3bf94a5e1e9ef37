//! Self-certification policy checks.
//!
//! A delegation must never quietly hand a decision to the person whose
//! access is being decided. The check is pluggable; the default
//! implementation compares the proposed recipient against the certified
//! subjects of the affected items, honoring the definition's allowed level.

use std::sync::Arc;

use crate::error::Result;
use crate::services::store::CertificationStore;
use crate::types::{Certification, CertificationItem, Identity, SelfCertificationLevel};

/// Trait for self-certification checkers.
#[async_trait::async_trait]
pub trait SelfCertificationChecker: Send + Sync {
    /// Whether handing the given items to `recipient` would constitute a
    /// forbidden self-certification.
    async fn is_self_certify(
        &self,
        recipient: &Identity,
        items: &[&CertificationItem],
        certification: &Certification,
    ) -> Result<bool>;
}

/// Default checker: the recipient self-certifies when they are the
/// certified subject of any affected item's entity.
pub struct SubjectSelfCertificationChecker {
    store: Arc<dyn CertificationStore>,
}

impl SubjectSelfCertificationChecker {
    /// Create a new checker backed by the given store.
    pub fn new(store: Arc<dyn CertificationStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl SelfCertificationChecker for SubjectSelfCertificationChecker {
    async fn is_self_certify(
        &self,
        recipient: &Identity,
        items: &[&CertificationItem],
        certification: &Certification,
    ) -> Result<bool> {
        // The allowed level may exempt this recipient entirely.
        let exempt = match certification.definition.self_certification_level {
            SelfCertificationLevel::All => true,
            SelfCertificationLevel::CertificationAdministrator => {
                recipient.certification_admin || recipient.system_admin
            }
            SelfCertificationLevel::SystemAdministrator => recipient.system_admin,
        };
        if exempt {
            return Ok(false);
        }

        for item in items {
            let Some(entity) = self.store.get_entity(item.entity_id).await? else {
                continue;
            };
            if entity.target_name == recipient.name {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
