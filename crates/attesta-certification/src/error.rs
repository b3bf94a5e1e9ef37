//! Error types for the certification engine.

use thiserror::Error;

use crate::types::{CertificationId, EntityId, ItemId};

/// Errors raised by the certification decision engine.
#[derive(Debug, Clone, Error)]
pub enum CertificationError {
    /// The resolved role does not permit the attempted operation. Never
    /// downgraded; the caller must surface it.
    #[error("not authorized: {reason}")]
    Unauthorized {
        /// Which consistency rule rejected the operation.
        reason: DecisionConflict,
    },

    /// Delegating to this recipient would have them certify their own
    /// access, which the configured policy forbids.
    #[error("delegation to '{recipient}' would self-certify")]
    SelfCertification {
        /// Login name of the offending recipient.
        recipient: String,
    },

    /// The object was concurrently locked by another request. Carries the
    /// validation messages accumulated before the lock was detected.
    #[error("object locked: {}", messages.join("; "))]
    Locked {
        /// User-facing messages describing the partial outcome.
        messages: Vec<String>,
    },

    /// The item already has an active delegation; it must be revoked
    /// before delegating again.
    #[error("item is already delegated")]
    AlreadyDelegated,

    /// A delegation review was requested but the item has no decision to
    /// review.
    #[error("no decision to review")]
    NoDecisionToReview,

    /// A state the engine's branches do not expect. Logged and neutralized
    /// by callers that have a safe default.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Certification not found.
    #[error("certification not found: {0}")]
    CertificationNotFound(CertificationId),

    /// Certification entity not found.
    #[error("certification entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Certification item not found.
    #[error("certification item not found: {0}")]
    ItemNotFound(ItemId),

    /// Identity not found in the directory.
    #[error("identity not found: {0}")]
    IdentityNotFound(String),
}

/// The decision-consistency rule that rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionConflict {
    /// The decision is locked by the certification phase.
    LockedByPhase,
    /// The decision is locked because revokes are processed immediately.
    LockedByRevokes,
    /// The requester cannot decide an item while its entity is delegated.
    EntityDelegated,
    /// A delegate cannot change a decision made outside the delegation.
    DecidedOutsideDelegation,
    /// The requester cannot decide a delegated item, only revoke it.
    ItemDelegated,
    /// A work-item owner cannot act when nothing is delegated to them.
    NothingDelegated,
    /// An entity delegate cannot change a nested item delegation they did
    /// not request.
    ForeignItemDelegation,
    /// The certification has been signed.
    Signed,
}

impl std::fmt::Display for DecisionConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LockedByPhase => write!(f, "decision is locked by the certification phase"),
            Self::LockedByRevokes => write!(f, "decision is locked by revocation processing"),
            Self::EntityDelegated => {
                write!(f, "item belongs to a delegated entity and cannot be decided here")
            }
            Self::DecidedOutsideDelegation => {
                write!(f, "decision was made outside this delegation")
            }
            Self::ItemDelegated => write!(f, "item is delegated and can only be revoked"),
            Self::NothingDelegated => {
                write!(f, "nothing is delegated to this work item's owner")
            }
            Self::ForeignItemDelegation => {
                write!(f, "item delegation was requested by someone else")
            }
            Self::Signed => write!(f, "certification has been signed"),
        }
    }
}

/// Type alias for Results using [`CertificationError`].
pub type Result<T> = std::result::Result<T, CertificationError>;
