//! Status-choice calculation.
//!
//! Produces the ordered list of decisions a viewer may pick for an item.
//! Each item kind registers a handler in a lookup table, so a new kind is
//! a table entry rather than another switch arm.

use crate::services::role::{ReviewContext, ReviewerRole};
use crate::types::{DecisionStatus, EntityType, ItemType};

/// The decision choices offered for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChoices {
    /// Allowed decisions, in display order.
    pub choices: Vec<DecisionStatus>,
    /// The remediation dialog must be shown when a remediation is picked.
    pub show_remediation_dialog: bool,
}

/// Which choice handler an item kind uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChoiceKind {
    Standard,
    PolicyViolation,
}

type ChoiceHandler = fn(&ReviewContext<'_>, &ReviewerRole) -> StatusChoices;

const CHOICE_HANDLERS: &[(ChoiceKind, ChoiceHandler)] = &[
    (ChoiceKind::Standard, standard_choices),
    (ChoiceKind::PolicyViolation, violation_choices),
];

fn choice_kind(item_type: ItemType) -> ChoiceKind {
    match item_type {
        ItemType::PolicyViolation => ChoiceKind::PolicyViolation,
        _ => ChoiceKind::Standard,
    }
}

/// The ordered set of decisions the viewer may pick for the context's item.
pub fn status_choices(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> StatusChoices {
    let kind = choice_kind(ctx.item.item_type);
    let handler = CHOICE_HANDLERS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, h)| *h)
        .unwrap_or(standard_choices);
    handler(ctx, role)
}

/// Whether the approve-account convenience action is allowed.
fn approve_account_allowed(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> bool {
    !role.is_viewing_item_work_item && ctx.certification.definition.allow_approve_accounts
}

/// Whether the revoke-account decision is allowed.
fn revoke_account_allowed(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> bool {
    !role.is_viewing_item_work_item && ctx.certification.definition.allow_account_revocation
}

fn standard_choices(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> StatusChoices {
    let definition = &ctx.certification.definition;
    let mut choices = vec![DecisionStatus::Approved];

    let account_actions = ctx.item.allow_account_level_actions(ctx.certification);

    // Approve-account is a convenience so users do not have to approve
    // every item on an account; it is meaningless on account items.
    if !matches!(ctx.item.item_type, ItemType::Account)
        && approve_account_allowed(ctx, role)
        && account_actions
    {
        choices.push(DecisionStatus::ApproveAccount);
    }

    if !ctx.item.use_revoke_account_instead_of_revoke(ctx.certification) {
        choices.push(DecisionStatus::Remediated);
    }

    // Revoke-account stays on offer when plain revoke is suppressed, even
    // if the definition would not normally allow it.
    if account_actions && revoke_account_allowed(ctx, role) {
        choices.push(DecisionStatus::RevokeAccount);
    }

    // Account group and business role subjects cannot be mitigated.
    if !matches!(
        ctx.entity.entity_type,
        EntityType::AccountGroup | EntityType::BusinessRole
    ) && definition.allow_exceptions
    {
        choices.push(DecisionStatus::Mitigated);
    }

    // No delegating from within the item's own delegation work item.
    if !role.is_viewing_item_work_item && definition.allow_item_delegation {
        choices.push(DecisionStatus::Delegated);
    }

    StatusChoices {
        choices,
        show_remediation_dialog: false,
    }
}

fn violation_choices(ctx: &ReviewContext<'_>, role: &ReviewerRole) -> StatusChoices {
    let mut choices = vec![DecisionStatus::Mitigated, DecisionStatus::Remediated];

    // Violations ride on the entity-delegation permission rather than the
    // item-delegation one.
    if !role.is_viewing_item_work_item && ctx.certification.definition.allow_entity_delegation {
        choices.push(DecisionStatus::Delegated);
    }

    // The certifier always has to choose which conflicting roles to remove.
    StatusChoices {
        choices,
        show_remediation_dialog: true,
    }
}
