//! Editability and display-status rules.
//!
//! Given the classified [`ReviewerRole`], decides whether an item's
//! decision is read-only for the viewer and which status the viewer is
//! allowed to see. The editability rules form a decision table over the
//! delegation shape of the (item, entity) pair; the arms transcribe the
//! authorization rules exactly, including the owner/non-owner asymmetry in
//! the entity-delegated arm.

use crate::services::locks::DecisionLockPolicy;
use crate::services::role::{ReviewContext, ReviewerRole};
use crate::types::{
    normalize_display_status, CertificationChallenge, CompletionState, DecisionStatus,
};

/// Which of the item and its entity currently carry an active delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationShape {
    /// Neither the item nor its entity is delegated.
    Neither,
    /// Only the item is delegated.
    ItemOnly,
    /// Only the entity is delegated.
    EntityOnly,
    /// Both the item and its entity are delegated.
    Both,
}

/// Classify the delegation shape of the context's (item, entity) pair.
pub fn delegation_shape(ctx: &ReviewContext<'_>) -> DelegationShape {
    match (ctx.item.is_delegated(), ctx.entity.is_entity_delegated()) {
        (false, false) => DelegationShape::Neither,
        (true, false) => DelegationShape::ItemOnly,
        (false, true) => DelegationShape::EntityOnly,
        (true, true) => DelegationShape::Both,
    }
}

/// Whether the item's decision is read-only for the viewer.
pub fn is_read_only(
    ctx: &ReviewContext<'_>,
    role: &ReviewerRole,
    policy: &dyn DecisionLockPolicy,
) -> bool {
    // A signed certification is immutable, whoever is looking.
    if ctx.certification.has_been_signed() {
        return true;
    }

    let action = ctx.item.action.as_ref();
    let phase = ctx.item.effective_phase(ctx.certification);
    if policy.is_decision_locked_by_phase(ctx.certification, action, phase)
        || policy.is_decision_locked_by_revokes(
            ctx.certification,
            ctx.item_delegation(),
            ctx.entity_delegation(),
            action,
        )
    {
        return true;
    }

    match delegation_shape(ctx) {
        // Nothing is delegated: only certification owners may edit.
        DelegationShape::Neither => !role.is_certification_owner,

        // The item is delegated: editable for its delegation owner, for
        // its requester outside of the delegation's own work item, and for
        // a certifier who requested it and is looking at the report (so
        // the requester can still revoke it).
        DelegationShape::ItemOnly => {
            !(role.is_item_delegation_owner
                || (role.is_item_delegation_requester && !role.is_viewing_item_work_item)
                || (role.is_certification_owner
                    && role.is_certifier_item_delegation_requester
                    && role.is_viewing_certification))
        }

        // The entity is delegated and the item is not. The rules differ for
        // the entity delegation's owner and everyone else; both arms are
        // kept branch-for-branch.
        DelegationShape::EntityOnly => {
            let delegation_returned = ctx.item.is_returned();
            let is_returned_item_requester =
                delegation_returned && role.is_item_delegation_requester;

            if role.is_identity_delegation_owner {
                if (is_returned_item_requester || !delegation_returned)
                    && (ctx.item.action.is_none() || role.is_item_action_actor)
                {
                    false
                } else if !role.was_item_decided_outside_of_identity_delegation {
                    false
                } else {
                    !(role.is_certification_owner
                        && role.is_viewing_certification
                        && role.was_item_decided_outside_of_identity_delegation)
                }
            } else if role.is_item_action_actor {
                false
            } else if is_returned_item_requester && role.is_viewing_certification {
                false
            } else {
                !(role.is_certification_owner
                    && role.is_viewing_certification
                    && role.was_item_decided_outside_of_identity_delegation)
            }
        }

        // Both are delegated: the entity delegate may only touch an item
        // delegation they requested themselves; the item's delegate and
        // requester keep their access.
        DelegationShape::Both => {
            if role.is_identity_delegation_owner {
                !role.is_item_delegation_requester
            } else {
                !(role.is_item_delegation_owner || role.is_item_delegation_requester)
            }
        }
    }
}

/// The decision status to display to the viewer, or `None` when there is
/// no decision to show.
///
/// Raw action statuses are normalized first and then masked as `Delegated`
/// whenever the viewer is not entitled to see a decision made under an
/// open delegation.
pub fn display_status(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> Option<DecisionStatus> {
    let raw = ctx.item.action.as_ref().map(normalize_display_status);
    let item_delegated = ctx.item.is_delegated();
    let entity_delegated = ctx.entity.is_entity_delegated();

    if role.is_viewing_certification {
        if item_delegated {
            Some(DecisionStatus::Delegated)
        } else if entity_delegated {
            if role.is_item_action_actor || role.was_item_decided_outside_of_identity_delegation
            {
                raw
            } else {
                Some(DecisionStatus::Delegated)
            }
        } else {
            raw
        }
    } else if item_delegated {
        if role.is_item_action_actor || role.is_viewing_item_work_item {
            raw
        } else if role.is_item_delegation_requester
            || role.is_identity_delegation_requester
            || role.is_identity_delegation_owner
        {
            Some(DecisionStatus::Delegated)
        } else {
            raw
        }
    } else {
        // Inside a work item with the item itself not delegated, the raw
        // status is shown whether or not the entity is delegated.
        raw
    }
}

/// Whether to offer the certifier a review of a delegated decision.
pub fn show_delegation_review(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> bool {
    // Only offered to owners in the certification report.
    if !(role.is_viewing_certification && role.is_certification_owner) {
        return false;
    }

    let identity_del_active = ctx
        .entity_delegation()
        .is_some_and(|d| d.is_active());

    !ctx.item.is_returned()
        && ctx.item.requires_review(ctx.entity_delegation())
        && (!role.was_item_decided_during_identity_delegation || !identity_del_active)
}

/// Whether to show the comments of a finished item delegation.
pub fn show_delegation_comments(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> bool {
    show_delegation_completion(CompletionState::Finished, ctx, role)
}

/// Whether to show that the item's delegation was returned undecided.
pub fn show_returned_delegation(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> bool {
    show_delegation_completion(CompletionState::Returned, ctx, role)
}

fn show_delegation_completion(
    state: CompletionState,
    ctx: &ReviewContext<'_>,
    role: &ReviewerRole,
) -> bool {
    let Some(item_del) = ctx.item_delegation() else {
        return false;
    };

    // The review link supersedes the plain comment display.
    if show_delegation_review(ctx, role) {
        return false;
    }
    if item_del.completion_state != Some(state) {
        return false;
    }

    match item_del.acting_work_item {
        // Delegated straight from the certification: visible in the report
        // and to the certification owner.
        None => role.is_viewing_certification || role.is_certification_owner,
        Some(acting) => {
            if role.is_item_delegation_requester {
                return true;
            }
            if role.is_viewing_identity_work_item {
                return true;
            }
            // The identity delegation the item was delegated from has
            // closed, so its requester context no longer exists.
            ctx.entity_delegation().is_some_and(|identity_del| {
                !identity_del.is_active() && Some(acting) == identity_del.work_item
            })
        }
    }
}

/// Challenge indicators for an item, derived from its challenge state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChallengeVisibility {
    /// An open challenge should be shown.
    pub show_challenge: bool,
    /// The challenge decision window expired before an answer.
    pub show_challenge_expiration: bool,
    /// The viewer may still answer the challenge.
    pub allow_challenge_decision: bool,
}

/// Compute the challenge indicators for the context's item.
pub fn challenge_visibility(challenge: Option<&CertificationChallenge>) -> ChallengeVisibility {
    let mut visibility = ChallengeVisibility::default();
    let Some(challenge) = challenge else {
        return visibility;
    };
    if !challenge.challenged {
        return visibility;
    }

    if challenge.decision_expired {
        visibility.show_challenge_expiration = true;
    } else {
        visibility.show_challenge = true;
    }
    visibility.allow_challenge_decision = visibility.show_challenge && !challenge.decided;
    visibility
}
