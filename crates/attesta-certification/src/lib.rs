//! Access-certification decision and delegation authorization engine.
//!
//! This crate carries the domain logic behind periodic access reviews:
//! given a snapshot of a certification, its entities and items, and the
//! identity looking at them, it decides what that identity may see, what
//! they may change, and applies the changes they request.
//!
//! # Components
//!
//! - [`services::actor`] - who counts as the author of a recorded decision
//!   or delegation, including authorship inherited through reassigned work
//!   items
//! - [`services::role`] - the immutable fact set describing one viewer's
//!   relation to one item
//! - [`services::visibility`] - whether the item is read-only for the
//!   viewer and which status may be shown to them
//! - [`services::choices`] - the ordered list of decisions the viewer may
//!   pick, by item kind
//! - [`services::locks`] - pluggable phase-lock and revoke-lock rules
//! - [`services::decision`] - validates and applies decision transitions,
//!   delegations, reviews, and sign-off
//!
//! # Seams
//!
//! Persistence, identity lookup, self-certification policy, and refresh
//! are consumed through traits ([`services::store::CertificationStore`],
//! [`services::actor::IdentityDirectory`],
//! [`services::self_certification::SelfCertificationChecker`],
//! [`services::store::RefreshSink`]), each with an in-memory
//! implementation for tests.
//!
//! # Audit
//!
//! Every applied change is recorded through [`audit::AuditStore`];
//! [`audit::InMemoryAuditStore`] doubles as the test probe for
//! persistence-write counts.

pub mod audit;
pub mod error;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CertificationError, DecisionConflict, Result};
pub use types::{
    normalize_display_status,
    Certification,
    CertificationAction,
    CertificationChallenge,
    CertificationDefinition,
    CertificationDelegation,
    CertificationEntity,
    CertificationId,
    CertificationItem,
    CertificationPhase,
    CertificationType,
    CompletionState,
    DecisionStatus,
    EntitlementGranularity,
    EntityId,
    EntityType,
    Identity,
    ItemId,
    ItemType,
    OwnerTransfer,
    SelfCertificationLevel,
    WorkItem,
    WorkItemId,
    WorkItemMonitor,
};

// Re-export service types
pub use services::{
    challenge_visibility,
    delegation_shape,
    display_status,
    is_read_only,
    show_delegation_comments,
    show_delegation_review,
    show_returned_delegation,
    status_choices,
    ActorResolver,
    CertificationStore,
    ChallengeVisibility,
    DecisionLockPolicy,
    DecisionService,
    DelegationShape,
    DelegationTarget,
    IdentityDirectory,
    InMemoryCertificationStore,
    InMemoryIdentityDirectory,
    InMemoryRefreshSink,
    RefreshSink,
    ReviewContext,
    ReviewerRole,
    RevokedDelegation,
    RoleService,
    SelfCertificationChecker,
    SignOutcome,
    StandardLockPolicy,
    StatusChoices,
    SubjectSelfCertificationChecker,
};

// Re-export audit types
pub use audit::{AuditStore, DecisionAuditAction, DecisionAuditEvent, InMemoryAuditStore};
