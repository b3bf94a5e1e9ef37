//! Fixture factories for integration tests.
//!
//! Builds certification graphs with predictable names so failures read
//! well: amy certifies, bob and carol receive delegations, victor is the
//! certified subject.

use attesta_certification::{
    Certification, CertificationDefinition, CertificationEntity, CertificationId,
    CertificationItem, CertificationPhase, CertificationType, EntitlementGranularity, EntityId,
    EntityType, Identity, ItemId, ItemType, OwnerTransfer, WorkItem, WorkItemId,
};
use chrono::Utc;

/// The certifier.
pub fn amy() -> Identity {
    Identity::named("amy", "Amy Marsh")
}

/// A delegate.
pub fn bob() -> Identity {
    Identity::named("bob", "Bob Ames")
}

/// Another delegate; inherits reassigned work items in several tests.
pub fn carol() -> Identity {
    Identity::named("carol", "Carol Finch")
}

/// The certified subject.
pub fn victor() -> Identity {
    Identity::named("victor", "Victor Price")
}

/// Everyone above.
pub fn everyone() -> Vec<Identity> {
    vec![amy(), bob(), carol(), victor()]
}

/// An active manager certification certified by amy.
pub fn certification() -> Certification {
    Certification {
        id: CertificationId::new(),
        name: "Q3 manager access review".to_string(),
        certification_type: CertificationType::Manager,
        certifiers: vec!["amy".to_string()],
        phase: CertificationPhase::Active,
        signed: None,
        work_items: Vec::new(),
        entitlement_granularity: EntitlementGranularity::Value,
        enabled_phases: vec![CertificationPhase::Active, CertificationPhase::End],
        process_revokes_immediately: false,
        reassignment_parent_certifiers: Vec::new(),
        definition: CertificationDefinition::default(),
    }
}

/// An identity entity for victor under the given certification.
pub fn entity(certification: &Certification) -> CertificationEntity {
    CertificationEntity {
        id: EntityId::new(),
        certification_id: certification.id,
        entity_type: EntityType::Identity,
        target_name: "victor".to_string(),
        delegation: None,
    }
}

/// An exception item on victor's Payroll account.
pub fn exception_item(
    certification: &Certification,
    entity: &CertificationEntity,
) -> CertificationItem {
    CertificationItem {
        id: ItemId::new(),
        entity_id: entity.id,
        certification_id: certification.id,
        item_type: ItemType::Exception,
        phase: None,
        action: None,
        delegation: None,
        challenge: None,
        exception_application: Some("Payroll".to_string()),
        exception_account: Some("victor.p".to_string()),
    }
}

/// A policy-violation item for victor.
pub fn violation_item(
    certification: &Certification,
    entity: &CertificationEntity,
) -> CertificationItem {
    CertificationItem {
        id: ItemId::new(),
        entity_id: entity.id,
        certification_id: certification.id,
        item_type: ItemType::PolicyViolation,
        phase: None,
        action: None,
        delegation: None,
        challenge: None,
        exception_application: None,
        exception_account: None,
    }
}

/// A work item owned by `owner`, previously owned by `previous` (matched
/// by display name in buck-passing).
pub fn reassigned_work_item(id: WorkItemId, owner: &Identity, previous: &Identity) -> WorkItem {
    WorkItem {
        id,
        owner_name: owner.name.clone(),
        owner_history: vec![OwnerTransfer {
            from_display_name: previous.display_name.clone(),
            to_display_name: owner.display_name.clone(),
            at: Utc::now(),
        }],
    }
}
