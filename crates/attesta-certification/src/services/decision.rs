//! Decision transitions.
//!
//! Validates and applies requested status changes on certification items:
//! approvals, revocations, mitigations, delegations, clears, reviews, and
//! sign-off. Every change goes through the pre-action consistency guard,
//! is persisted through the [`CertificationStore`], marked for refresh,
//! and recorded in the audit log.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::audit::{AuditStore, DecisionAuditAction, DecisionAuditEventInput};
use crate::error::{CertificationError, DecisionConflict, Result};
use crate::services::actor::IdentityDirectory;
use crate::services::locks::{DecisionLockPolicy, StandardLockPolicy};
use crate::services::self_certification::{
    SelfCertificationChecker, SubjectSelfCertificationChecker,
};
use crate::services::store::{CertificationStore, RefreshSink};
use crate::types::{
    normalize_display_status, Certification, CertificationAction, CertificationDelegation,
    CertificationEntity, CertificationId, CertificationItem, DecisionStatus, EntityId, Identity,
    ItemId, ItemType, WorkItemId,
};

/// What a delegation operation should apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationTarget {
    /// A single item.
    Item(ItemId),
    /// A whole entity.
    Entity(EntityId),
}

/// What a delegation revocation ended up revoking.
///
/// Revoking "the delegation of an item" whose item-level delegation is no
/// longer active falls back to the entity-level delegation, so callers
/// must not assume the item reference survived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokedDelegation {
    /// The item-level delegation was revoked.
    Item(ItemId),
    /// The entity-level delegation was revoked.
    Entity(EntityId),
    /// Nothing was delegated; the request was a no-op.
    None,
}

/// Outcome of a sign-off attempt. A concurrent lock does not fail the
/// operation; it surfaces as warnings instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    /// The certification was signed by this request.
    pub signed: bool,
    /// User-facing messages collected along the way.
    pub warnings: Vec<String>,
}

struct Loaded {
    certification: Certification,
    entity: CertificationEntity,
    item: CertificationItem,
}

/// Service applying decision transitions to certification items.
pub struct DecisionService {
    store: Arc<dyn CertificationStore>,
    directory: Arc<dyn IdentityDirectory>,
    lock_policy: Arc<dyn DecisionLockPolicy>,
    self_certification: Arc<dyn SelfCertificationChecker>,
    audit: Arc<dyn AuditStore>,
    refresh: Arc<dyn RefreshSink>,
}

impl DecisionService {
    /// Create a new decision service with the stock lock policy and the
    /// subject-based self-certification checker.
    pub fn new(
        store: Arc<dyn CertificationStore>,
        directory: Arc<dyn IdentityDirectory>,
        audit: Arc<dyn AuditStore>,
        refresh: Arc<dyn RefreshSink>,
    ) -> Self {
        Self {
            self_certification: Arc::new(SubjectSelfCertificationChecker::new(store.clone())),
            store,
            directory,
            lock_policy: Arc::new(StandardLockPolicy),
            audit,
            refresh,
        }
    }

    /// Replace the decision-lock policy.
    pub fn with_lock_policy(mut self, policy: Arc<dyn DecisionLockPolicy>) -> Self {
        self.lock_policy = policy;
        self
    }

    /// Replace the self-certification checker.
    pub fn with_self_certification_checker(
        mut self,
        checker: Arc<dyn SelfCertificationChecker>,
    ) -> Self {
        self.self_certification = checker;
        self
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Approve an item.
    pub async fn approve(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        comments: Option<String>,
    ) -> Result<CertificationItem> {
        self.apply_decision(
            item_id,
            viewer,
            work_item,
            DecisionStatus::Approved,
            comments,
            None,
            None,
            None,
            DecisionAuditAction::Approved,
        )
        .await
    }

    /// Approve an item and every undecided item on the same account.
    pub async fn approve_account(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        comments: Option<String>,
    ) -> Result<CertificationItem> {
        let approved = self
            .apply_decision(
                item_id,
                viewer,
                work_item,
                DecisionStatus::Approved,
                comments,
                None,
                None,
                None,
                DecisionAuditAction::ApprovedAccount,
            )
            .await?;

        // Fan out to siblings: decisions copied from this one carry a
        // source reference so delegation review covers them through it.
        let siblings = self.store.list_items_for_entity(approved.entity_id).await?;
        for mut sibling in siblings {
            if !approved.same_account(&sibling) || sibling.action.is_some() {
                continue;
            }
            let mut action =
                CertificationAction::decided(DecisionStatus::Approved, viewer, work_item);
            action.source_item = Some(approved.id);
            sibling.action = Some(action);
            self.store.save_item(&sibling).await?;
            self.refresh.mark_for_refresh(sibling.id).await?;
        }

        Ok(approved)
    }

    /// Revoke an item. The optional recipient owns the generated
    /// remediation work.
    pub async fn remediate(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        recipient: Option<String>,
        description: Option<String>,
        comments: Option<String>,
    ) -> Result<CertificationItem> {
        self.apply_decision(
            item_id,
            viewer,
            work_item,
            DecisionStatus::Remediated,
            comments,
            description,
            recipient,
            None,
            DecisionAuditAction::Remediated,
        )
        .await
    }

    /// Revoke the whole account an item lives on.
    ///
    /// Invoked from the certification report this also force-revokes an
    /// open delegation of the item, matching the behavior of other bulk
    /// account actions; from inside the delegation's own work item the
    /// delegation is left alone.
    #[allow(clippy::too_many_arguments)]
    pub async fn revoke_account(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        recipient: Option<String>,
        description: Option<String>,
        comments: Option<String>,
    ) -> Result<CertificationItem> {
        let loaded = self.load(item_id).await?;
        if loaded.item.is_delegated() && work_item.is_none() {
            self.revoke_delegation(DelegationTarget::Item(item_id), viewer, work_item)
                .await?;
        }

        self.apply_decision(
            item_id,
            viewer,
            work_item,
            DecisionStatus::RevokeAccount,
            comments,
            description,
            recipient,
            None,
            DecisionAuditAction::RevokedAccount,
        )
        .await
    }

    /// Allow an exception for a period of time. Without an explicit
    /// expiration the definition's default duration is applied.
    pub async fn mitigate(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        expiration: Option<DateTime<Utc>>,
        comments: Option<String>,
    ) -> Result<CertificationItem> {
        let loaded = self.load(item_id).await?;
        let expiration = expiration.or_else(|| {
            loaded
                .certification
                .definition
                .exception_duration_days
                .map(|days| Utc::now() + Duration::days(days))
        });

        self.apply_decision(
            item_id,
            viewer,
            work_item,
            DecisionStatus::Mitigated,
            comments,
            None,
            None,
            expiration,
            DecisionAuditAction::Mitigated,
        )
        .await
    }

    /// Acknowledge a violation, letting the exception expire at the next
    /// certification instead of at a fixed date.
    pub async fn acknowledge(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        comments: Option<String>,
    ) -> Result<CertificationItem> {
        self.apply_decision(
            item_id,
            viewer,
            work_item,
            DecisionStatus::Acknowledged,
            comments,
            None,
            None,
            None,
            DecisionAuditAction::Acknowledged,
        )
        .await
    }

    /// Clear the current decision.
    pub async fn clear_decision(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
    ) -> Result<CertificationItem> {
        let mut loaded = self.load(item_id).await?;
        self.check_decision_errors(&loaded, viewer, work_item, None, true)?;

        let previous = loaded.item.action.as_ref().map(normalize_display_status);
        self.remove_returned_delegations(&mut loaded).await?;

        // Clearing counts as a change, so a completed delegation record is
        // dropped along with it.
        if loaded.item.action.is_some() {
            if let Some(delegation) = loaded.item.delegation.as_ref() {
                if !delegation.is_active() {
                    loaded.item.delegation = None;
                }
            }
        }

        if loaded.item.action.is_some() {
            loaded.item.action = Some(CertificationAction::decided(
                DecisionStatus::Cleared,
                viewer,
                work_item,
            ));
        }

        self.store.save_item(&loaded.item).await?;
        self.refresh.mark_for_refresh(loaded.item.id).await?;
        self.log_decision(
            &loaded,
            viewer,
            work_item,
            DecisionAuditAction::Cleared,
            previous,
            Some(DecisionStatus::Cleared),
            None,
        )
        .await?;

        Ok(loaded.item)
    }

    /// Save the selected decision only if it differs from the one already
    /// displayed. Returns whether a save happened.
    ///
    /// Only the statuses saved without a popup dialog are legal here; the
    /// others must have been saved through their own operations already.
    pub async fn save_if_changed(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        previous: Option<DecisionStatus>,
        selected: Option<DecisionStatus>,
    ) -> Result<bool> {
        if selected == previous {
            return Ok(false);
        }

        match selected {
            Some(DecisionStatus::Approved) => {
                self.approve(item_id, viewer, work_item, None).await?;
                Ok(true)
            }
            Some(DecisionStatus::Remediated) => {
                self.remediate(item_id, viewer, work_item, None, None, None)
                    .await?;
                Ok(true)
            }
            Some(DecisionStatus::RevokeAccount) => {
                self.revoke_account(item_id, viewer, work_item, None, None, None)
                    .await?;
                Ok(true)
            }
            other => {
                tracing::warn!(
                    item_id = %item_id,
                    status = ?other,
                    "unexpected status reached the plain save path"
                );
                Err(CertificationError::InvalidState(format!(
                    "certification item {item_id} should have already been saved"
                )))
            }
        }
    }

    // ------------------------------------------------------------------
    // Delegations
    // ------------------------------------------------------------------

    /// Hand responsibility for an item or entity to another identity.
    ///
    /// Fails with [`CertificationError::SelfCertification`] when the
    /// recipient is a certified subject the policy does not allow to
    /// certify their own access; the delegation is not created.
    pub async fn delegate(
        &self,
        target: DelegationTarget,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        recipient_name: &str,
        description: Option<String>,
        comments: Option<String>,
    ) -> Result<()> {
        let recipient = self
            .directory
            .find_by_name(recipient_name)
            .await?
            .ok_or_else(|| CertificationError::IdentityNotFound(recipient_name.to_string()))?;

        match target {
            DelegationTarget::Item(item_id) => {
                let mut loaded = self.load(item_id).await?;
                self.ensure_not_signed(&loaded.certification)?;
                self.ensure_not_self_certify(
                    &recipient,
                    &[&loaded.item],
                    &loaded.certification,
                )
                .await?;

                if loaded.item.is_delegated() {
                    return Err(CertificationError::AlreadyDelegated);
                }

                // Delegating clears any decision already made; its context
                // is preserved on the delegation for rollback.
                loaded.item.action = None;
                loaded.item.delegation = Some(self.new_delegation(
                    &loaded.certification,
                    viewer,
                    work_item,
                    recipient_name,
                    description,
                    comments,
                ));
                self.remove_returned_delegations(&mut loaded).await?;

                self.store.save_item(&loaded.item).await?;
                self.refresh.mark_for_refresh(loaded.item.id).await?;
                self.log_decision(
                    &loaded,
                    viewer,
                    work_item,
                    DecisionAuditAction::Delegated,
                    None,
                    Some(DecisionStatus::Delegated),
                    Some(serde_json::json!({ "recipient": recipient_name })),
                )
                .await?;
            }
            DelegationTarget::Entity(entity_id) => {
                let entity = self
                    .store
                    .get_entity(entity_id)
                    .await?
                    .ok_or(CertificationError::EntityNotFound(entity_id))?;
                let certification = self
                    .store
                    .get_certification(entity.certification_id)
                    .await?
                    .ok_or(CertificationError::CertificationNotFound(
                        entity.certification_id,
                    ))?;
                self.ensure_not_signed(&certification)?;

                let items = self.store.list_items_for_entity(entity_id).await?;
                let item_refs: Vec<&CertificationItem> = items.iter().collect();
                self.ensure_not_self_certify(&recipient, &item_refs, &certification)
                    .await?;

                if entity.is_entity_delegated() {
                    return Err(CertificationError::AlreadyDelegated);
                }

                let mut entity = entity;
                entity.delegation = Some(self.new_delegation(
                    &certification,
                    viewer,
                    work_item,
                    recipient_name,
                    description,
                    comments,
                ));
                self.store.save_entity(&entity).await?;

                // The entity delegation overrides returned item
                // delegations underneath it.
                for mut item in items {
                    if item.is_returned() {
                        item.delegation = None;
                        self.store.save_item(&item).await?;
                        self.refresh.mark_for_refresh(item.id).await?;
                    }
                }

                self.audit
                    .log_event(DecisionAuditEventInput {
                        certification_id: certification.id,
                        item_id: None,
                        action: DecisionAuditAction::Delegated,
                        actor_name: viewer.name.clone(),
                        work_item,
                        previous_status: None,
                        new_status: Some(DecisionStatus::Delegated),
                        metadata: Some(serde_json::json!({ "recipient": recipient_name })),
                    })
                    .await?;
            }
        }

        Ok(())
    }

    /// Revoke a delegation, rolling back any decision made inside it.
    ///
    /// An item target whose item-level delegation is no longer active
    /// falls back to the entity-level delegation; the returned value says
    /// what was actually revoked.
    pub async fn revoke_delegation(
        &self,
        target: DelegationTarget,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
    ) -> Result<RevokedDelegation> {
        match target {
            DelegationTarget::Item(item_id) => {
                let mut loaded = self.load(item_id).await?;

                if !loaded.item.is_delegated() {
                    // The item-level delegation is gone; the request can
                    // only have meant the entity-level one.
                    return self
                        .revoke_entity_delegation(loaded.entity.id, viewer, work_item)
                        .await;
                }

                if let Some(delegation) = loaded.item.delegation.as_mut() {
                    rollback_action_in(&mut loaded.item.action, delegation.work_item);
                    delegation.revoke();
                }
                self.store.save_item(&loaded.item).await?;
                self.refresh.mark_for_refresh(loaded.item.id).await?;
                self.log_decision(
                    &loaded,
                    viewer,
                    work_item,
                    DecisionAuditAction::DelegationRevoked,
                    Some(DecisionStatus::Delegated),
                    None,
                    None,
                )
                .await?;

                Ok(RevokedDelegation::Item(item_id))
            }
            DelegationTarget::Entity(entity_id) => {
                self.revoke_entity_delegation(entity_id, viewer, work_item)
                    .await
            }
        }
    }

    /// Mark a delegated decision as reviewed, when the caller is in a
    /// delegation review. A review without a decision is an error.
    pub async fn mark_as_reviewed_if_reviewing(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        reviewing: bool,
    ) -> Result<()> {
        if !reviewing {
            return Ok(());
        }

        let mut loaded = self.load(item_id).await?;
        let Some(action) = loaded.item.action.as_mut() else {
            return Err(CertificationError::NoDecisionToReview);
        };
        action.reviewed = true;
        let status = normalize_display_status(action);

        self.store.save_item(&loaded.item).await?;
        self.log_decision(
            &loaded,
            viewer,
            None,
            DecisionAuditAction::Reviewed,
            Some(status),
            Some(status),
            None,
        )
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sign-off
    // ------------------------------------------------------------------

    /// Sign off a certification.
    ///
    /// A concurrent lock on the certification is not fatal: the lock's
    /// accumulated messages come back as warnings and `signed` is false.
    pub async fn sign(
        &self,
        certification_id: CertificationId,
        viewer: &Identity,
    ) -> Result<SignOutcome> {
        match self.store.sign(certification_id, &viewer.name).await {
            Ok(_) => {
                let warnings = self.refresh.refresh(certification_id).await?;
                self.audit
                    .log_event(DecisionAuditEventInput {
                        certification_id,
                        item_id: None,
                        action: DecisionAuditAction::Signed,
                        actor_name: viewer.name.clone(),
                        work_item: None,
                        previous_status: None,
                        new_status: None,
                        metadata: None,
                    })
                    .await?;
                Ok(SignOutcome {
                    signed: true,
                    warnings,
                })
            }
            Err(CertificationError::Locked { messages }) => {
                tracing::warn!(
                    certification_id = %certification_id,
                    "certification was locked during sign-off"
                );
                Ok(SignOutcome {
                    signed: false,
                    warnings: messages,
                })
            }
            Err(err) => Err(err),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load(&self, item_id: ItemId) -> Result<Loaded> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or(CertificationError::ItemNotFound(item_id))?;
        let entity = self
            .store
            .get_entity(item.entity_id)
            .await?
            .ok_or(CertificationError::EntityNotFound(item.entity_id))?;
        let certification = self
            .store
            .get_certification(item.certification_id)
            .await?
            .ok_or(CertificationError::CertificationNotFound(
                item.certification_id,
            ))?;
        Ok(Loaded {
            certification,
            entity,
            item,
        })
    }

    fn ensure_not_signed(&self, certification: &Certification) -> Result<()> {
        if certification.has_been_signed() {
            return Err(CertificationError::Unauthorized {
                reason: DecisionConflict::Signed,
            });
        }
        Ok(())
    }

    async fn ensure_not_self_certify(
        &self,
        recipient: &Identity,
        items: &[&CertificationItem],
        certification: &Certification,
    ) -> Result<()> {
        if self
            .self_certification
            .is_self_certify(recipient, items, certification)
            .await?
        {
            return Err(CertificationError::SelfCertification {
                recipient: recipient.name.clone(),
            });
        }
        Ok(())
    }

    fn new_delegation(
        &self,
        certification: &Certification,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        recipient_name: &str,
        description: Option<String>,
        comments: Option<String>,
    ) -> CertificationDelegation {
        let mut delegation = CertificationDelegation::handed_to(recipient_name, viewer, work_item);
        delegation.review_required = certification.definition.require_delegation_review;
        delegation.description = description;
        delegation.comments = comments;
        delegation
    }

    /// The decision-consistency guard run before every decision change.
    fn check_decision_errors(
        &self,
        loaded: &Loaded,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        new_status: Option<DecisionStatus>,
        is_action_on_this_item: bool,
    ) -> Result<()> {
        let certification = &loaded.certification;
        let entity = &loaded.entity;
        let item = &loaded.item;

        self.ensure_not_signed(certification)?;

        // The pseudo-status is stored as a remediation, so lock comparison
        // happens on the stored form.
        let new_stored = match new_status {
            Some(DecisionStatus::RevokeAccount) => Some(DecisionStatus::Remediated),
            other => other,
        };
        let current = item.action.as_ref().map(|a| a.status);
        let changing = current != new_stored;

        let phase = item.effective_phase(certification);
        if changing
            && self
                .lock_policy
                .is_decision_locked_by_phase(certification, item.action.as_ref(), phase)
        {
            return Err(CertificationError::Unauthorized {
                reason: DecisionConflict::LockedByPhase,
            });
        }
        if changing
            && self.lock_policy.is_decision_locked_by_revokes(
                certification,
                item.delegation.as_ref(),
                entity.delegation.as_ref(),
                item.action.as_ref(),
            )
        {
            return Err(CertificationError::Unauthorized {
                reason: DecisionConflict::LockedByRevokes,
            });
        }

        if !is_action_on_this_item {
            return Ok(());
        }

        let entity_del = entity.delegation.as_ref();
        let entity_delegated = entity_del.is_some_and(|d| d.is_active());
        let is_requester_of_returned = item.is_returned()
            && item
                .delegation
                .as_ref()
                .is_some_and(|d| d.actor_name == viewer.name);

        // A requester cannot decide an item that currently belongs to an
        // entity delegate: neither an undecided one nor one decided inside
        // the delegation.
        if let Some(entity_del) = entity_del {
            if entity_delegated && work_item.is_none() {
                let undecided = item.action.is_none() && !is_requester_of_returned;
                let decided_in_delegation = item.action.as_ref().is_some_and(|a| {
                    entity_del.work_item.is_some()
                        && entity_del.work_item == a.acting_work_item
                });
                if undecided || decided_in_delegation {
                    return Err(CertificationError::Unauthorized {
                        reason: DecisionConflict::EntityDelegated,
                    });
                }
            }
        }

        // A delegate cannot change a decision that was made outside the
        // delegation chain.
        if entity_delegated
            && work_item.is_some()
            && item.action.is_some()
            && !item.was_decided_in_identity_delegation_chain(entity_del)
        {
            return Err(CertificationError::Unauthorized {
                reason: DecisionConflict::DecidedOutsideDelegation,
            });
        }

        // A requester may only revoke a delegated item, never decide it.
        if item.is_delegated() && work_item.is_none() && new_status.is_some() {
            return Err(CertificationError::Unauthorized {
                reason: DecisionConflict::ItemDelegated,
            });
        }

        // A work-item owner cannot act when nothing is delegated anymore.
        if !item.is_delegated() && !entity_delegated && work_item.is_some() {
            return Err(CertificationError::Unauthorized {
                reason: DecisionConflict::NothingDelegated,
            });
        }

        // An entity delegate viewing a nested item delegation they did not
        // request cannot change it.
        if item.is_delegated() && work_item.is_some() {
            if let Some(item_del) = item.delegation.as_ref() {
                if work_item != item_del.work_item && item_del.actor_name != viewer.name {
                    return Err(CertificationError::Unauthorized {
                        reason: DecisionConflict::ForeignItemDelegation,
                    });
                }
            }
        }

        Ok(())
    }

    /// Clear returned delegations on the item and its entity; a new
    /// decision supersedes them and their work items are already gone.
    async fn remove_returned_delegations(&self, loaded: &mut Loaded) -> Result<()> {
        if loaded.item.is_returned() {
            loaded.item.delegation = None;
        }
        if loaded
            .entity
            .delegation
            .as_ref()
            .is_some_and(|d| d.is_returned())
        {
            loaded.entity.delegation = None;
            self.store.save_entity(&loaded.entity).await?;
        }
        Ok(())
    }

    /// Clear revoke-account decisions on sibling items of the same account
    /// when this item's new decision is not a revoke-account.
    async fn clear_other_revoke_account_items(
        &self,
        loaded: &Loaded,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        is_revoke_account: bool,
    ) -> Result<()> {
        if is_revoke_account
            || !matches!(
                loaded.item.item_type,
                ItemType::Exception | ItemType::AccountGroupMembership
            )
        {
            return Ok(());
        }

        let siblings = self.store.list_items_for_entity(loaded.entity.id).await?;
        for mut sibling in siblings {
            if !loaded.item.same_account(&sibling) {
                continue;
            }
            let revoked_account = sibling
                .action
                .as_ref()
                .is_some_and(|a| a.revoke_account);
            if !revoked_account {
                continue;
            }

            let previous = sibling.action.as_ref().map(normalize_display_status);
            sibling.action = Some(CertificationAction::decided(
                DecisionStatus::Cleared,
                viewer,
                work_item,
            ));
            self.store.save_item(&sibling).await?;
            self.refresh.mark_for_refresh(sibling.id).await?;
            self.audit
                .log_event(DecisionAuditEventInput {
                    certification_id: loaded.certification.id,
                    item_id: Some(sibling.id),
                    action: DecisionAuditAction::Cleared,
                    actor_name: viewer.name.clone(),
                    work_item,
                    previous_status: previous,
                    new_status: Some(DecisionStatus::Cleared),
                    metadata: None,
                })
                .await?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_decision(
        &self,
        item_id: ItemId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        requested: DecisionStatus,
        comments: Option<String>,
        description: Option<String>,
        recipient: Option<String>,
        mitigation_expiration: Option<DateTime<Utc>>,
        audit_action: DecisionAuditAction,
    ) -> Result<CertificationItem> {
        let mut loaded = self.load(item_id).await?;
        self.check_decision_errors(&loaded, viewer, work_item, Some(requested), true)?;

        let previous = loaded.item.action.as_ref().map(normalize_display_status);

        // Stored form of the requested status.
        let (stored, revoke_account) = match requested {
            DecisionStatus::RevokeAccount => (DecisionStatus::Remediated, true),
            status => (status, false),
        };

        self.remove_returned_delegations(&mut loaded).await?;
        self.clear_other_revoke_account_items(&loaded, viewer, work_item, revoke_account)
            .await?;

        // A changed decision drops a completed delegation record; its
        // review context no longer applies to the new decision.
        let changing = loaded
            .item
            .action
            .as_ref()
            .map_or(true, |a| a.status != stored);
        if changing {
            if let Some(delegation) = loaded.item.delegation.as_ref() {
                if !delegation.is_active() {
                    loaded.item.delegation = None;
                }
            }
        }

        let mut action = CertificationAction::decided(stored, viewer, work_item);
        action.revoke_account = revoke_account;
        action.comments = comments;
        action.description = description;
        action.owner_name = recipient;
        action.mitigation_expiration = mitigation_expiration;
        loaded.item.action = Some(action);

        self.store.save_item(&loaded.item).await?;
        self.refresh.mark_for_refresh(loaded.item.id).await?;

        tracing::info!(
            item_id = %loaded.item.id,
            status = %requested,
            actor = %viewer.name,
            "saved certification decision"
        );

        self.log_decision(
            &loaded,
            viewer,
            work_item,
            audit_action,
            previous,
            Some(requested),
            None,
        )
        .await?;

        Ok(loaded.item)
    }

    async fn revoke_entity_delegation(
        &self,
        entity_id: EntityId,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
    ) -> Result<RevokedDelegation> {
        let mut entity = self
            .store
            .get_entity(entity_id)
            .await?
            .ok_or(CertificationError::EntityNotFound(entity_id))?;

        let Some(delegation) = entity.delegation.as_mut() else {
            tracing::warn!(entity_id = %entity_id, "entity is not delegated, cannot revoke");
            return Ok(RevokedDelegation::None);
        };
        let delegation_work_item = delegation.work_item;
        delegation.revoke();
        self.store.save_entity(&entity).await?;

        // Roll back decisions made inside the delegation's work item.
        let items = self.store.list_items_for_entity(entity_id).await?;
        for mut item in items {
            let before = item.action.clone();
            rollback_action_in(&mut item.action, delegation_work_item);
            if before != item.action {
                self.store.save_item(&item).await?;
                self.refresh.mark_for_refresh(item.id).await?;
            }
        }

        self.audit
            .log_event(DecisionAuditEventInput {
                certification_id: entity.certification_id,
                item_id: None,
                action: DecisionAuditAction::DelegationRevoked,
                actor_name: viewer.name.clone(),
                work_item,
                previous_status: Some(DecisionStatus::Delegated),
                new_status: None,
                metadata: None,
            })
            .await?;

        Ok(RevokedDelegation::Entity(entity_id))
    }

    #[allow(clippy::too_many_arguments)]
    async fn log_decision(
        &self,
        loaded: &Loaded,
        viewer: &Identity,
        work_item: Option<WorkItemId>,
        action: DecisionAuditAction,
        previous_status: Option<DecisionStatus>,
        new_status: Option<DecisionStatus>,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        self.audit
            .log_event(DecisionAuditEventInput {
                certification_id: loaded.certification.id,
                item_id: Some(loaded.item.id),
                action,
                actor_name: viewer.name.clone(),
                work_item,
                previous_status,
                new_status,
                metadata,
            })
            .await?;
        Ok(())
    }
}

/// Null out an action that was decided inside the given work item; used
/// when the delegation it belongs to is being revoked.
fn rollback_action_in(action: &mut Option<CertificationAction>, work_item: Option<WorkItemId>) {
    let decided_inside = action
        .as_ref()
        .is_some_and(|a| a.acting_work_item.is_some() && a.acting_work_item == work_item);
    if decided_inside {
        *action = None;
    }
}
