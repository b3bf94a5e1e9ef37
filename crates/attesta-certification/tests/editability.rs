//! Integration tests for the editability decision table.
//!
//! Roles are classified through the real classifier (not hand-built), so
//! these pin the whole path from snapshot to verdict.

mod common;

use attesta_certification::{
    is_read_only, CertificationAction, CertificationDelegation, CompletionState, DecisionStatus,
    Identity, ReviewContext, StandardLockPolicy, WorkItemId,
};
use chrono::Utc;
use common::fixtures;
use common::TestHarness;

async fn read_only_for(
    harness: &TestHarness,
    viewer: &Identity,
    item_id: attesta_certification::ItemId,
    viewed_work_item: Option<WorkItemId>,
) -> bool {
    let item = harness.item(item_id).await;
    let entity = harness.entity(item.entity_id).await;
    let certification = harness.certification(item.certification_id).await;
    let ctx = ReviewContext {
        viewer,
        certification: &certification,
        entity: &entity,
        item: &item,
        viewed_work_item,
    };
    let role = harness.roles.classify(&ctx).await.unwrap();
    is_read_only(&ctx, &role, &StandardLockPolicy)
}

/// Scenario A: a signed certification is read-only even for a certifier.
#[tokio::test]
async fn test_signed_certification_is_read_only_for_certifier() {
    let harness = TestHarness::new();
    harness.seed_identities(&fixtures::everyone()).await;

    let mut cert = fixtures::certification();
    cert.signed = Some(Utc::now());
    let entity = fixtures::entity(&cert);
    let item = fixtures::exception_item(&cert, &entity);
    harness.seed_graph(&cert, &entity, &[item.clone()]).await;

    assert!(read_only_for(&harness, &fixtures::amy(), item.id, None).await);
}

/// Scenario B: a reassigned delegation work item carries authorship to the
/// new owner, so the item stays editable and unmasked for them.
#[tokio::test]
async fn test_reassigned_work_item_owner_inherits_authorship() {
    let harness = TestHarness::new();
    harness.seed_identities(&fixtures::everyone()).await;

    let mut cert = fixtures::certification();
    let entity = fixtures::entity(&cert);
    let mut item = fixtures::exception_item(&cert, &entity);

    // Amy delegated the item; the delegation work item went to bob, who
    // approved, and was then reassigned to carol. Forwarding resets the
    // delegation owner but not the action's actor.
    let wi = WorkItemId::new();
    let mut delegation = CertificationDelegation::handed_to("bob", &fixtures::amy(), None);
    delegation.work_item = Some(wi);
    delegation.owner_name = "carol".to_string();
    item.delegation = Some(delegation);
    item.action = Some(CertificationAction::decided(
        DecisionStatus::Approved,
        &fixtures::bob(),
        Some(wi),
    ));
    cert.work_items = vec![fixtures::reassigned_work_item(
        wi,
        &fixtures::carol(),
        &fixtures::bob(),
    )];

    harness.seed_graph(&cert, &entity, &[item.clone()]).await;

    let carol = fixtures::carol();
    assert!(!read_only_for(&harness, &carol, item.id, Some(wi)).await);

    // The raw status shows rather than the delegation mask.
    let loaded = harness.item(item.id).await;
    let entity = harness.entity(loaded.entity_id).await;
    let certification = harness.certification(loaded.certification_id).await;
    let ctx = ReviewContext {
        viewer: &carol,
        certification: &certification,
        entity: &entity,
        item: &loaded,
        viewed_work_item: Some(wi),
    };
    let role = harness.roles.classify(&ctx).await.unwrap();
    assert!(role.is_item_action_actor);
    assert_eq!(
        attesta_certification::display_status(&ctx, &role),
        Some(DecisionStatus::Approved)
    );
}

/// Scenario C: the entity delegate may decide an undecided item.
#[tokio::test]
async fn test_entity_delegate_may_decide_undecided_item() {
    let harness = TestHarness::new();
    harness.seed_identities(&fixtures::everyone()).await;

    let cert = fixtures::certification();
    let mut entity = fixtures::entity(&cert);
    let delegation = CertificationDelegation::handed_to("bob", &fixtures::amy(), None);
    let wi = delegation.work_item;
    entity.delegation = Some(delegation);
    let item = fixtures::exception_item(&cert, &entity);
    harness.seed_graph(&cert, &entity, &[item.clone()]).await;

    assert!(!read_only_for(&harness, &fixtures::bob(), item.id, wi).await);
}

/// While the entity is delegated, the certifier cannot edit an undecided
/// item from the report, but can still edit a decision they made in the
/// certification before delegating.
#[tokio::test]
async fn test_entity_delegation_locks_certifier_out_of_undecided_items() {
    let harness = TestHarness::new();
    harness.seed_identities(&fixtures::everyone()).await;

    let cert = fixtures::certification();
    let mut entity = fixtures::entity(&cert);
    entity.delegation = Some(CertificationDelegation::handed_to(
        "bob",
        &fixtures::amy(),
        None,
    ));
    let undecided = fixtures::exception_item(&cert, &entity);
    let mut decided = fixtures::exception_item(&cert, &entity);
    decided.action = Some(CertificationAction::decided(
        DecisionStatus::Approved,
        &fixtures::amy(),
        None,
    ));
    harness
        .seed_graph(&cert, &entity, &[undecided.clone(), decided.clone()])
        .await;

    let amy = fixtures::amy();
    assert!(read_only_for(&harness, &amy, undecided.id, None).await);
    assert!(!read_only_for(&harness, &amy, decided.id, None).await);
}

/// The entity delegate cannot touch a decision made outside the
/// delegation chain.
#[tokio::test]
async fn test_entity_delegate_blocked_from_outside_decisions() {
    let harness = TestHarness::new();
    harness.seed_identities(&fixtures::everyone()).await;

    let cert = fixtures::certification();
    let mut entity = fixtures::entity(&cert);
    let delegation = CertificationDelegation::handed_to("bob", &fixtures::amy(), None);
    let wi = delegation.work_item;
    entity.delegation = Some(delegation);
    let mut item = fixtures::exception_item(&cert, &entity);
    item.action = Some(CertificationAction::decided(
        DecisionStatus::Approved,
        &fixtures::amy(),
        None,
    ));
    harness.seed_graph(&cert, &entity, &[item.clone()]).await;

    assert!(read_only_for(&harness, &fixtures::bob(), item.id, wi).await);
}

/// A returned item delegation keeps its requester's access from the
/// report while the entity is delegated.
#[tokio::test]
async fn test_returned_item_requester_keeps_access_from_report() {
    let harness = TestHarness::new();
    harness.seed_identities(&fixtures::everyone()).await;

    let cert = fixtures::certification();
    let mut entity = fixtures::entity(&cert);
    entity.delegation = Some(CertificationDelegation::handed_to(
        "bob",
        &fixtures::amy(),
        None,
    ));
    let mut item = fixtures::exception_item(&cert, &entity);
    let mut returned = CertificationDelegation::handed_to("carol", &fixtures::amy(), None);
    returned.completion_state = Some(CompletionState::Returned);
    item.delegation = Some(returned);
    harness.seed_graph(&cert, &entity, &[item.clone()]).await;

    assert!(!read_only_for(&harness, &fixtures::amy(), item.id, None).await);

    // Bob, the entity delegate, is not the requester, but with no
    // decision made outside his delegation the item is still his to
    // decide.
    assert!(!read_only_for(&harness, &fixtures::bob(), item.id, None).await);
}

/// Row-by-row table over the entity-delegated arm, with roles built by
/// hand so each fact combination is pinned explicitly. The `returned
/// requester outside the report` row is the asymmetry between the owner
/// and non-owner sub-cases: the owner side does not require the report
/// view, the non-owner side does.
#[test]
fn test_entity_delegated_arm_decision_table() {
    struct Row {
        name: &'static str,
        identity_delegation_owner: bool,
        item_delegation_returned: bool,
        returned_requester: bool,
        has_action: bool,
        action_actor: bool,
        certification_owner: bool,
        viewing_certification: bool,
        decided_outside: bool,
        read_only: bool,
    }

    let rows = [
        Row {
            name: "owner decides an undecided item",
            identity_delegation_owner: true,
            item_delegation_returned: false,
            returned_requester: false,
            has_action: false,
            action_actor: false,
            certification_owner: false,
            viewing_certification: false,
            decided_outside: false,
            read_only: false,
        },
        Row {
            name: "owner edits their own decision",
            identity_delegation_owner: true,
            item_delegation_returned: false,
            returned_requester: false,
            has_action: true,
            action_actor: true,
            certification_owner: false,
            viewing_certification: false,
            decided_outside: false,
            read_only: false,
        },
        Row {
            name: "owner blocked from a decision made outside",
            identity_delegation_owner: true,
            item_delegation_returned: false,
            returned_requester: false,
            has_action: true,
            action_actor: false,
            certification_owner: false,
            viewing_certification: false,
            decided_outside: true,
            read_only: true,
        },
        Row {
            name: "owner who is a certifier reviews the outside decision from the report",
            identity_delegation_owner: true,
            item_delegation_returned: false,
            returned_requester: false,
            has_action: true,
            action_actor: false,
            certification_owner: true,
            viewing_certification: true,
            decided_outside: true,
            read_only: false,
        },
        Row {
            name: "owner takes over a returned delegation they did not request",
            identity_delegation_owner: true,
            item_delegation_returned: true,
            returned_requester: false,
            has_action: false,
            action_actor: false,
            certification_owner: false,
            viewing_certification: false,
            decided_outside: false,
            read_only: false,
        },
        Row {
            name: "non-owner actor keeps their decision",
            identity_delegation_owner: false,
            item_delegation_returned: false,
            returned_requester: false,
            has_action: true,
            action_actor: true,
            certification_owner: false,
            viewing_certification: false,
            decided_outside: false,
            read_only: false,
        },
        Row {
            name: "returned requester edits from the report",
            identity_delegation_owner: false,
            item_delegation_returned: true,
            returned_requester: true,
            has_action: false,
            action_actor: false,
            certification_owner: false,
            viewing_certification: true,
            decided_outside: false,
            read_only: false,
        },
        Row {
            name: "returned requester outside the report is locked out",
            identity_delegation_owner: false,
            item_delegation_returned: true,
            returned_requester: true,
            has_action: false,
            action_actor: false,
            certification_owner: false,
            viewing_certification: false,
            decided_outside: false,
            read_only: true,
        },
        Row {
            name: "certifier reviews an outside decision from the report",
            identity_delegation_owner: false,
            item_delegation_returned: false,
            returned_requester: false,
            has_action: true,
            action_actor: false,
            certification_owner: true,
            viewing_certification: true,
            decided_outside: true,
            read_only: false,
        },
        Row {
            name: "certifier cannot decide an undecided delegated entity item",
            identity_delegation_owner: false,
            item_delegation_returned: false,
            returned_requester: false,
            has_action: false,
            action_actor: false,
            certification_owner: true,
            viewing_certification: true,
            decided_outside: false,
            read_only: true,
        },
    ];

    for row in rows {
        let cert = fixtures::certification();
        let mut entity = fixtures::entity(&cert);
        entity.delegation = Some(CertificationDelegation::handed_to(
            "bob",
            &fixtures::amy(),
            None,
        ));
        let mut item = fixtures::exception_item(&cert, &entity);
        if row.item_delegation_returned {
            let mut returned =
                CertificationDelegation::handed_to("carol", &fixtures::amy(), None);
            returned.completion_state = Some(CompletionState::Returned);
            item.delegation = Some(returned);
        }
        if row.has_action {
            item.action = Some(CertificationAction::decided(
                DecisionStatus::Approved,
                &fixtures::amy(),
                None,
            ));
        }

        let amy = fixtures::amy();
        let ctx = ReviewContext {
            viewer: &amy,
            certification: &cert,
            entity: &entity,
            item: &item,
            viewed_work_item: None,
        };
        let role = attesta_certification::ReviewerRole {
            is_identity_delegation_owner: row.identity_delegation_owner,
            is_item_delegation_requester: row.returned_requester,
            is_item_action_actor: row.action_actor,
            is_certification_owner: row.certification_owner,
            is_viewing_certification: row.viewing_certification,
            was_item_decided_outside_of_identity_delegation: row.decided_outside,
            ..Default::default()
        };

        assert_eq!(
            is_read_only(&ctx, &role, &StandardLockPolicy),
            row.read_only,
            "row failed: {}",
            row.name
        );
    }
}

/// With both levels delegated, only the item delegation's owner and
/// requester keep access.
#[tokio::test]
async fn test_both_delegated_access_matrix() {
    let harness = TestHarness::new();
    harness.seed_identities(&fixtures::everyone()).await;

    let cert = fixtures::certification();
    let mut entity = fixtures::entity(&cert);
    let entity_del = CertificationDelegation::handed_to("bob", &fixtures::amy(), None);
    let entity_wi = entity_del.work_item;
    entity.delegation = Some(entity_del);

    let mut item = fixtures::exception_item(&cert, &entity);
    // Bob delegated the item to carol from within his entity work item.
    let mut item_del = CertificationDelegation::handed_to("carol", &fixtures::bob(), entity_wi);
    item_del.acting_work_item = entity_wi;
    let item_wi = item_del.work_item;
    item.delegation = Some(item_del);
    harness.seed_graph(&cert, &entity, &[item.clone()]).await;

    // Bob requested the nested delegation: editable.
    assert!(!read_only_for(&harness, &fixtures::bob(), item.id, entity_wi).await);
    // Carol owns it: editable.
    assert!(!read_only_for(&harness, &fixtures::carol(), item.id, item_wi).await);
    // Amy, plain certifier: read-only.
    assert!(read_only_for(&harness, &fixtures::amy(), item.id, None).await);
}
