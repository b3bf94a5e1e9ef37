//! Role classification.
//!
//! Produces the immutable fact set describing a viewer's relation to one
//! certification item: ownership of the certification, ownership or
//! authorship of the item/entity delegations, authorship of the decision,
//! and which page context the item is viewed from. Every editability and
//! display rule downstream consumes only these facts.

use std::sync::Arc;

use crate::error::Result;
use crate::services::actor::{ActorResolver, IdentityDirectory};
use crate::types::{
    Certification, CertificationDelegation, CertificationEntity, CertificationItem, Identity,
    WorkItemId, WorkItemMonitor,
};

/// The request-scoped snapshot a role is classified against: the viewer,
/// the object graph, and the work item the page is rendered in (if any).
/// Built once per operation and passed by reference to pure functions.
#[derive(Debug, Clone, Copy)]
pub struct ReviewContext<'a> {
    /// The authenticated viewer.
    pub viewer: &'a Identity,
    /// The certification the item belongs to.
    pub certification: &'a Certification,
    /// The entity the item belongs to.
    pub entity: &'a CertificationEntity,
    /// The item under review.
    pub item: &'a CertificationItem,
    /// The work item being viewed; `None` when viewing the certification
    /// report itself.
    pub viewed_work_item: Option<WorkItemId>,
}

impl<'a> ReviewContext<'a> {
    /// Entity-level delegation, if any.
    pub fn entity_delegation(&self) -> Option<&'a CertificationDelegation> {
        self.entity.delegation.as_ref()
    }

    /// Item-level delegation, if any.
    pub fn item_delegation(&self) -> Option<&'a CertificationDelegation> {
        self.item.delegation.as_ref()
    }
}

/// A viewer's relation to one certification item. All fields are read-only
/// facts computed by [`RoleService::classify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewerRole {
    /// The viewer made the item's decision, directly or by inheriting the
    /// work item it was decided in.
    pub is_item_action_actor: bool,
    /// The viewer requested the item delegation.
    pub is_item_delegation_requester: bool,
    /// The item delegation was requested directly from the certification,
    /// by a certifier rather than a delegate.
    pub is_certifier_item_delegation_requester: bool,
    /// The viewer currently owns the item delegation.
    pub is_item_delegation_owner: bool,
    /// The viewer requested the entity delegation.
    pub is_identity_delegation_requester: bool,
    /// The viewer currently owns the entity delegation.
    pub is_identity_delegation_owner: bool,
    /// The viewer is a certifier, a certification administrator, or owns
    /// the parent of a bulk reassignment.
    pub is_certification_owner: bool,
    /// The item is viewed from the certification report.
    pub is_viewing_certification: bool,
    /// The item is viewed from its own delegation work item.
    pub is_viewing_item_work_item: bool,
    /// The item is viewed from its entity's delegation work item.
    pub is_viewing_identity_work_item: bool,
    /// The decision was made inside the entity delegation chain.
    pub was_item_decided_during_identity_delegation: bool,
    /// The decision was made in the certification directly, or in some
    /// other context than the active entity delegation.
    pub was_item_decided_outside_of_identity_delegation: bool,
}

/// Classifies viewers against certification items.
pub struct RoleService {
    resolver: ActorResolver,
}

impl RoleService {
    /// Create a new role service backed by the given directory.
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self {
            resolver: ActorResolver::new(directory),
        }
    }

    /// Compute the viewer's role facts for the context's item.
    pub async fn classify(&self, ctx: &ReviewContext<'_>) -> Result<ReviewerRole> {
        let action = ctx.item.action.as_ref();
        let item_del = ctx.item_delegation();
        let identity_del = ctx.entity_delegation();
        let cert = ctx.certification;
        let viewer = ctx.viewer;

        // Certifiers get reset when work is forwarded, so plain membership
        // is enough here; administrators and bulk-reassignment parent
        // owners are treated as owners as well.
        let is_certification_owner = cert.certifiers.iter().any(|c| c == &viewer.name)
            || viewer.certification_admin
            || cert
                .reassignment_parent_certifiers
                .iter()
                .any(|c| c == &viewer.name);

        let is_item_delegation_owner = item_del.is_some_and(|d| d.owner_name == viewer.name);
        let is_identity_delegation_owner =
            identity_del.is_some_and(|d| d.owner_name == viewer.name);

        // Actors are retained across forwarding, so each of these may
        // resolve through the owner-history scan.
        let is_item_action_actor = self
            .resolver
            .is_actor(viewer, action.map(|a| a as &dyn WorkItemMonitor), cert)
            .await?;
        let is_item_delegation_requester = self
            .resolver
            .is_actor(viewer, item_del.map(|d| d as &dyn WorkItemMonitor), cert)
            .await?;
        let is_identity_delegation_requester = self
            .resolver
            .is_actor(viewer, identity_del.map(|d| d as &dyn WorkItemMonitor), cert)
            .await?;

        let is_certifier_item_delegation_requester =
            item_del.is_some_and(|d| d.acting_work_item.is_none());

        let action_occurred_in_cert =
            action.is_some_and(|a| a.acting_work_item.is_none());
        let was_item_decided_during_identity_delegation = ctx
            .item
            .was_decided_in_identity_delegation_chain(identity_del);
        let was_item_decided_outside_of_identity_delegation = action_occurred_in_cert
            || (action.is_some() && !was_item_decided_during_identity_delegation);

        Ok(ReviewerRole {
            is_item_action_actor,
            is_item_delegation_requester,
            is_certifier_item_delegation_requester,
            is_item_delegation_owner,
            is_identity_delegation_requester,
            is_identity_delegation_owner,
            is_certification_owner,
            is_viewing_certification: ctx.viewed_work_item.is_none(),
            is_viewing_item_work_item: is_viewing_work_item(ctx.viewed_work_item, item_del),
            is_viewing_identity_work_item: is_viewing_work_item(
                ctx.viewed_work_item,
                identity_del,
            ),
            was_item_decided_during_identity_delegation,
            was_item_decided_outside_of_identity_delegation,
        })
    }
}

/// Whether the viewed work item is the one tracking the given delegation.
fn is_viewing_work_item(
    viewed: Option<WorkItemId>,
    delegation: Option<&CertificationDelegation>,
) -> bool {
    match (viewed, delegation.and_then(|d| d.work_item)) {
        (Some(viewed), Some(open)) => viewed == open,
        _ => false,
    }
}
