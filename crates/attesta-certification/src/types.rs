//! Type definitions for the certification review domain.
//!
//! Includes newtype wrappers for IDs, enums for domain values, and the
//! snapshot structs the decision engine operates on. Snapshots are plain
//! data loaded through a [`crate::services::store::CertificationStore`];
//! nothing in this module touches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Application name reserved for the platform's own entitlements.
///
/// Account-level actions are never offered for items sourced from the
/// platform application itself.
pub const PLATFORM_APPLICATION: &str = "Attesta";

// ============================================================================
// ID Types (Newtype Pattern)
// ============================================================================

/// Unique identifier for a certification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificationId(pub Uuid);

impl CertificationId {
    /// Create a new random CertificationId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for CertificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CertificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CertificationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<CertificationId> for Uuid {
    fn from(id: CertificationId) -> Self {
        id.0
    }
}

/// Unique identifier for a certification entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random EntityId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Unique identifier for a certification item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Create a new random ItemId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ItemId> for Uuid {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Unique identifier for a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemId(pub Uuid);

impl WorkItemId {
    /// Create a new random WorkItemId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for WorkItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for WorkItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<WorkItemId> for Uuid {
    fn from(id: WorkItemId) -> Self {
        id.0
    }
}

// ============================================================================
// Enums
// ============================================================================

/// The kind of fact a certification item certifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// An additional entitlement held on an account.
    Exception,
    /// A detected role.
    Bundle,
    /// A policy violation.
    PolicyViolation,
    /// An entire account.
    Account,
    /// Membership in an account group.
    AccountGroupMembership,
    /// Ownership of a data target.
    DataOwner,
    /// A profile of a business role.
    BusinessRoleProfile,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exception => write!(f, "exception"),
            Self::Bundle => write!(f, "bundle"),
            Self::PolicyViolation => write!(f, "policy_violation"),
            Self::Account => write!(f, "account"),
            Self::AccountGroupMembership => write!(f, "account_group_membership"),
            Self::DataOwner => write!(f, "data_owner"),
            Self::BusinessRoleProfile => write!(f, "business_role_profile"),
        }
    }
}

/// The kind of subject a certification entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A person.
    Identity,
    /// An account group.
    AccountGroup,
    /// A business role.
    BusinessRole,
    /// A data-owner target.
    DataOwner,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::AccountGroup => write!(f, "account_group"),
            Self::BusinessRole => write!(f, "business_role"),
            Self::DataOwner => write!(f, "data_owner"),
        }
    }
}

/// The population a certification reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationType {
    /// Direct reports of a manager.
    Manager,
    /// Users of an application.
    ApplicationOwner,
    /// An arbitrary identity population.
    Identity,
    /// Owners of data targets.
    DataOwner,
    /// Permissions held by account groups.
    AccountGroupPermissions,
    /// Members of account groups.
    AccountGroupMembership,
    /// Composition of business roles.
    BusinessRoleComposition,
}

/// Decision statuses for a certification item.
///
/// `RevokeAccount` and `Delegated` are request/display pseudo-statuses:
/// a revoke-account is persisted as `Remediated` with the
/// [`CertificationAction::revoke_account`] flag, and `Delegated` is derived
/// from an open delegation rather than stored on the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Access was approved.
    Approved,
    /// All items on the account were approved in one action.
    ApproveAccount,
    /// Access was revoked.
    Remediated,
    /// The whole account was revoked.
    RevokeAccount,
    /// An exception was allowed for a period of time.
    Mitigated,
    /// The violation was acknowledged; treated as a mitigation for display.
    Acknowledged,
    /// Responsibility was handed to another identity.
    Delegated,
    /// A previous decision was cleared.
    Cleared,
}

impl DecisionStatus {
    /// Whether this status represents a remediation, including the
    /// revoke-account pseudo-status.
    pub fn is_remediation(&self) -> bool {
        matches!(self, Self::Remediated | Self::RevokeAccount)
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::ApproveAccount => write!(f, "approve_account"),
            Self::Remediated => write!(f, "remediated"),
            Self::RevokeAccount => write!(f, "revoke_account"),
            Self::Mitigated => write!(f, "mitigated"),
            Self::Acknowledged => write!(f, "acknowledged"),
            Self::Delegated => write!(f, "delegated"),
            Self::Cleared => write!(f, "cleared"),
        }
    }
}

/// Lifecycle phases of a certification. The ordering is meaningful:
/// phase-lock rules compare against [`CertificationPhase::Challenge`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CertificationPhase {
    /// Generated but not yet active.
    Staged,
    /// Open for decisions.
    Active,
    /// Affected users may challenge revocations.
    Challenge,
    /// Revocations are being carried out.
    Remediation,
    /// Closed.
    End,
}

impl fmt::Display for CertificationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staged => write!(f, "staged"),
            Self::Active => write!(f, "active"),
            Self::Challenge => write!(f, "challenge"),
            Self::Remediation => write!(f, "remediation"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Granularity at which entitlements were broken into items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementGranularity {
    /// One item per account.
    Application,
    /// One item per attribute.
    Attribute,
    /// One item per attribute value.
    Value,
}

/// Completion state of a delegation's work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    /// The delegate completed the work.
    Finished,
    /// The delegate returned the work undecided.
    Returned,
    /// The work item expired.
    Expired,
}

/// Who may certify their own access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfCertificationLevel {
    /// Any certifier may certify their own access.
    All,
    /// Only certification administrators may self-certify.
    CertificationAdministrator,
    /// Only system administrators may self-certify.
    SystemAdministrator,
}

// ============================================================================
// Identities and Work Items
// ============================================================================

/// A directory identity, as resolved through
/// [`crate::services::actor::IdentityDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique login name.
    pub name: String,
    /// Display name, as recorded in work-item owner histories.
    pub display_name: String,
    /// Holds the certification-administrator capability.
    pub certification_admin: bool,
    /// Holds the system-administrator capability.
    pub system_admin: bool,
}

impl Identity {
    /// Convenience constructor for an ordinary identity.
    pub fn named(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            certification_admin: false,
            system_admin: false,
        }
    }
}

/// One reassignment of a work item, oldest first in
/// [`WorkItem::owner_history`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerTransfer {
    /// Display name of the owner the work item was taken from.
    pub from_display_name: String,
    /// Display name of the owner the work item was given to.
    pub to_display_name: String,
    /// When the reassignment happened.
    pub at: DateTime<Utc>,
}

/// A task-inbox entry with a reassignable owner.
///
/// The owner history is an append-only log; resolution over it is a plain
/// linear scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier.
    pub id: WorkItemId,
    /// Login name of the current owner.
    pub owner_name: String,
    /// Reassignment log, oldest first.
    pub owner_history: Vec<OwnerTransfer>,
}

impl WorkItem {
    /// Whether the given display name appears as a previous owner.
    pub fn was_previous_owner(&self, display_name: &str) -> bool {
        self.owner_history
            .iter()
            .any(|t| t.from_display_name == display_name)
    }
}

// ============================================================================
// Monitors: actions and delegations
// ============================================================================

/// Common view over the two records that track work done on an item: the
/// decision ([`CertificationAction`]) and the handoff
/// ([`CertificationDelegation`]).
pub trait WorkItemMonitor {
    /// Login name of the identity that performed the recorded act.
    fn actor_name(&self) -> Option<&str>;

    /// The work item the act was performed in, if it was not performed
    /// directly in the certification.
    fn acting_work_item(&self) -> Option<WorkItemId>;
}

/// A recorded decision on a certification item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationAction {
    /// The stored decision status. Never `RevokeAccount` or `Delegated`;
    /// see [`normalize_display_status`].
    pub status: DecisionStatus,
    /// True when a `Remediated` status covers the whole account.
    pub revoke_account: bool,
    /// Who made the decision. Retained across work-item reassignment for
    /// auditing.
    pub actor_name: String,
    /// Work item the decision was made in; `None` means it was made
    /// directly in the certification.
    pub acting_work_item: Option<WorkItemId>,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
    /// Reviewer comments.
    pub comments: Option<String>,
    /// Work description for remediation/delegation recipients.
    pub description: Option<String>,
    /// Recipient of the remediation work generated by this decision, if
    /// the decision spawns any.
    pub owner_name: Option<String>,
    /// Set once a delegation review has signed off on this decision.
    pub reviewed: bool,
    /// The decision was copied from another item (account fan-out); such
    /// decisions are covered by the source item's review.
    pub source_item: Option<ItemId>,
    /// The remediation request has already been launched.
    pub remediation_kicked_off: bool,
    /// The approval carried additional provisioning of missing requirements.
    pub additional_provisioning: bool,
    /// Mitigation expiration, when `status` is `Mitigated`.
    pub mitigation_expiration: Option<DateTime<Utc>>,
}

impl CertificationAction {
    /// A fresh action with the given stored status, decided by `actor` in
    /// the optional `work_item`.
    pub fn decided(
        status: DecisionStatus,
        actor: &Identity,
        work_item: Option<WorkItemId>,
    ) -> Self {
        Self {
            status,
            revoke_account: false,
            actor_name: actor.name.clone(),
            acting_work_item: work_item,
            decided_at: Utc::now(),
            comments: None,
            description: None,
            owner_name: None,
            reviewed: false,
            source_item: None,
            remediation_kicked_off: false,
            additional_provisioning: false,
            mitigation_expiration: None,
        }
    }
}

impl WorkItemMonitor for CertificationAction {
    fn actor_name(&self) -> Option<&str> {
        Some(&self.actor_name)
    }

    fn acting_work_item(&self) -> Option<WorkItemId> {
        self.acting_work_item
    }
}

/// A recorded handoff of decision responsibility to another identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationDelegation {
    /// Login name of the identity the work was handed to.
    pub owner_name: String,
    /// Who requested the delegation.
    pub actor_name: String,
    /// Work item the delegation was requested in; `None` means it was
    /// requested directly in the certification.
    pub acting_work_item: Option<WorkItemId>,
    /// The open work item tracking this delegation, if one exists.
    pub work_item: Option<WorkItemId>,
    /// How the delegation's work item completed; `None` while open.
    pub completion_state: Option<CompletionState>,
    /// The delegation was revoked by its requester.
    pub revoked: bool,
    /// The certifier must review decisions made under this delegation.
    pub review_required: bool,
    /// Work description shown to the delegate.
    pub description: Option<String>,
    /// Comments for the delegate.
    pub comments: Option<String>,
}

impl CertificationDelegation {
    /// A fresh, open delegation to `recipient` requested by `actor` in the
    /// optional `work_item`.
    pub fn handed_to(
        recipient: impl Into<String>,
        actor: &Identity,
        work_item: Option<WorkItemId>,
    ) -> Self {
        Self {
            owner_name: recipient.into(),
            actor_name: actor.name.clone(),
            acting_work_item: work_item,
            work_item: Some(WorkItemId::new()),
            completion_state: None,
            revoked: false,
            review_required: false,
            description: None,
            comments: None,
        }
    }

    /// Whether the delegation is still open.
    pub fn is_active(&self) -> bool {
        !self.revoked && self.completion_state.is_none()
    }

    /// Whether the delegate returned the work undecided.
    pub fn is_returned(&self) -> bool {
        matches!(self.completion_state, Some(CompletionState::Returned))
    }

    /// Mark the delegation revoked.
    pub fn revoke(&mut self) {
        self.revoked = true;
    }
}

impl WorkItemMonitor for CertificationDelegation {
    fn actor_name(&self) -> Option<&str> {
        Some(&self.actor_name)
    }

    fn acting_work_item(&self) -> Option<WorkItemId> {
        self.acting_work_item
    }
}

// ============================================================================
// Challenge
// ============================================================================

/// Challenge state for a revoked item during the challenge phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CertificationChallenge {
    /// The affected user challenged the revocation.
    pub challenged: bool,
    /// The certifier's window to answer the challenge has expired.
    pub decision_expired: bool,
    /// The certifier has answered the challenge.
    pub decided: bool,
}

// ============================================================================
// Configuration
// ============================================================================

/// Feature flags of the certification definition consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationDefinition {
    /// Items may be delegated individually.
    pub allow_item_delegation: bool,
    /// Whole entities may be delegated.
    pub allow_entity_delegation: bool,
    /// Exceptions (mitigations) may be allowed.
    pub allow_exceptions: bool,
    /// The approve-account convenience action is offered.
    pub allow_approve_accounts: bool,
    /// Whole accounts may be revoked.
    pub allow_account_revocation: bool,
    /// Decisions made under delegation must be reviewed by the certifier.
    pub require_delegation_review: bool,
    /// Who may certify their own access.
    pub self_certification_level: SelfCertificationLevel,
    /// Default mitigation duration, in days.
    pub exception_duration_days: Option<i64>,
}

impl Default for CertificationDefinition {
    fn default() -> Self {
        Self {
            allow_item_delegation: true,
            allow_entity_delegation: true,
            allow_exceptions: true,
            allow_approve_accounts: true,
            allow_account_revocation: true,
            require_delegation_review: false,
            self_certification_level: SelfCertificationLevel::SystemAdministrator,
            exception_duration_days: None,
        }
    }
}

// ============================================================================
// Certification, Entity, Item
// ============================================================================

/// A review instance covering one entity population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    /// Unique identifier.
    pub id: CertificationId,
    /// Display name.
    pub name: String,
    /// The kind of population reviewed.
    pub certification_type: CertificationType,
    /// Login names of the certifiers; reset when the work is forwarded.
    pub certifiers: Vec<String>,
    /// Current lifecycle phase.
    pub phase: CertificationPhase,
    /// Set once the certification is signed off; everything becomes
    /// read-only from that point.
    pub signed: Option<DateTime<Utc>>,
    /// Work items generated for this certification.
    pub work_items: Vec<WorkItem>,
    /// How entitlements were broken into items.
    pub entitlement_granularity: EntitlementGranularity,
    /// Phases this certification runs through.
    pub enabled_phases: Vec<CertificationPhase>,
    /// Revocations are launched as soon as they are decided.
    pub process_revokes_immediately: bool,
    /// Certifier names of ancestor certifications when this one is a bulk
    /// reassignment child; those owners keep full access.
    pub reassignment_parent_certifiers: Vec<String>,
    /// Feature flags.
    pub definition: CertificationDefinition,
}

impl Certification {
    /// Whether the certification has been signed off.
    pub fn has_been_signed(&self) -> bool {
        self.signed.is_some()
    }

    /// Whether the given phase is part of this certification's lifecycle.
    pub fn is_phase_enabled(&self, phase: CertificationPhase) -> bool {
        self.enabled_phases.contains(&phase)
    }

    /// Look up one of this certification's work items. Returns `None` for
    /// IDs of work items that no longer exist.
    pub fn find_work_item(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.work_items.iter().find(|wi| wi.id == id)
    }
}

/// The subject under review: an identity, account group, role, or
/// data-owner target. Owns an entity-level delegation that can override
/// item-level visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationEntity {
    /// Unique identifier.
    pub id: EntityId,
    /// Owning certification.
    pub certification_id: CertificationId,
    /// The kind of subject.
    pub entity_type: EntityType,
    /// Login name of the certified subject.
    pub target_name: String,
    /// Entity-level delegation, if any.
    pub delegation: Option<CertificationDelegation>,
}

impl CertificationEntity {
    /// Whether the entity is currently delegated.
    pub fn is_entity_delegated(&self) -> bool {
        self.delegation.as_ref().is_some_and(|d| d.is_active())
    }
}

/// One certifiable fact inside an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationItem {
    /// Unique identifier.
    pub id: ItemId,
    /// Owning entity.
    pub entity_id: EntityId,
    /// Owning certification.
    pub certification_id: CertificationId,
    /// The kind of fact certified.
    pub item_type: ItemType,
    /// Phase override for rolling certifications; falls back to the
    /// certification's phase.
    pub phase: Option<CertificationPhase>,
    /// Current decision, if any.
    pub action: Option<CertificationAction>,
    /// Current item-level delegation, if any.
    pub delegation: Option<CertificationDelegation>,
    /// Challenge raised against a revocation, if any.
    pub challenge: Option<CertificationChallenge>,
    /// Application the certified entitlement lives on, for exception and
    /// account items.
    pub exception_application: Option<String>,
    /// Native account identity the entitlement lives on; items sharing it
    /// belong to the same account.
    pub exception_account: Option<String>,
}

impl CertificationItem {
    /// Whether the item is currently delegated.
    pub fn is_delegated(&self) -> bool {
        self.delegation.as_ref().is_some_and(|d| d.is_active())
    }

    /// Whether the item's delegation was returned undecided.
    pub fn is_returned(&self) -> bool {
        self.delegation.as_ref().is_some_and(|d| d.is_returned())
    }

    /// The phase governing this item's locks.
    pub fn effective_phase(&self, certification: &Certification) -> CertificationPhase {
        self.phase.unwrap_or(certification.phase)
    }

    /// Whether this item's decision still needs a delegation review.
    /// See [`requires_review`].
    pub fn requires_review(&self, entity_delegation: Option<&CertificationDelegation>) -> bool {
        requires_review(self.action.as_ref(), self.delegation.as_ref(), entity_delegation)
    }

    /// Whether this item's decision was made inside the given identity
    /// delegation, either directly in its work item or in an item
    /// delegation that was requested from that work item.
    pub fn was_decided_in_identity_delegation_chain(
        &self,
        identity_delegation: Option<&CertificationDelegation>,
    ) -> bool {
        let (Some(action), Some(identity_del)) = (&self.action, identity_delegation) else {
            return false;
        };
        let Some(acting) = action.acting_work_item else {
            return false;
        };
        if !identity_del.is_active() {
            return false;
        }

        if Some(acting) == identity_del.work_item {
            return true;
        }

        // The item delegation itself may have been requested from within the
        // identity delegation's work item.
        if let Some(item_del) = &self.delegation {
            let delegated_from_identity =
                item_del.acting_work_item.is_some() && item_del.acting_work_item == identity_del.work_item;
            if delegated_from_identity && Some(acting) == item_del.work_item {
                return true;
            }
        }

        false
    }

    /// Whether account-level actions (approve/revoke account) are allowed
    /// on this item.
    pub fn allow_account_level_actions(&self, certification: &Certification) -> bool {
        matches!(self.item_type, ItemType::Account | ItemType::Exception)
            && self.exception_application.as_deref() != Some(PLATFORM_APPLICATION)
            && !matches!(
                certification.certification_type,
                CertificationType::DataOwner | CertificationType::AccountGroupPermissions
            )
    }

    /// Whether revoke-account should be offered in place of revoke.
    pub fn use_revoke_account_instead_of_revoke(&self, certification: &Certification) -> bool {
        (matches!(self.item_type, ItemType::Account)
            || matches!(
                certification.entitlement_granularity,
                EntitlementGranularity::Application
            ))
            && self.allow_account_level_actions(certification)
    }

    /// Whether this item certifies the same account as `other`.
    pub fn same_account(&self, other: &CertificationItem) -> bool {
        self.id != other.id
            && self.exception_application.is_some()
            && self.exception_application == other.exception_application
            && self.exception_account.is_some()
            && self.exception_account == other.exception_account
    }
}

/// Whether a decision still needs a delegation review: a completed,
/// non-returned delegation (on the item or its entity) required review and
/// the decision has not been reviewed yet. Decisions copied from another
/// item are covered by the source item's review.
pub fn requires_review(
    action: Option<&CertificationAction>,
    item_delegation: Option<&CertificationDelegation>,
    entity_delegation: Option<&CertificationDelegation>,
) -> bool {
    let Some(action) = action else {
        return false;
    };
    if action.reviewed || action.source_item.is_some() {
        return false;
    }

    let needs = |del: Option<&CertificationDelegation>| {
        del.is_some_and(|d| d.review_required && !d.is_active() && !d.is_returned())
    };
    needs(item_delegation) || needs(entity_delegation)
}

// ============================================================================
// Display-status normalization
// ============================================================================

/// Collapse the stored status and flags of an action into the status shown
/// to reviewers.
///
/// This is the only place the two pseudo-status coercions live:
/// `Remediated` with the revoke-account flag surfaces as `RevokeAccount`,
/// and `Acknowledged` surfaces as `Mitigated`.
pub fn normalize_display_status(action: &CertificationAction) -> DecisionStatus {
    match action.status {
        DecisionStatus::Remediated if action.revoke_account => DecisionStatus::RevokeAccount,
        DecisionStatus::Acknowledged => DecisionStatus::Mitigated,
        status => status,
    }
}
