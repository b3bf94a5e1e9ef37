//! Engine services.
//!
//! Leaf to root: actor resolution feeds the role classifier, whose facts
//! drive the editability/display rules and the status-choice calculator;
//! the decision service applies transitions and talks to the storage,
//! refresh, and audit seams.

pub mod actor;
pub mod choices;
pub mod decision;
pub mod locks;
pub mod role;
pub mod self_certification;
pub mod store;
pub mod visibility;

pub use actor::{ActorResolver, IdentityDirectory, InMemoryIdentityDirectory};
pub use choices::{status_choices, StatusChoices};
pub use decision::{
    DecisionService, DelegationTarget, RevokedDelegation, SignOutcome,
};
pub use locks::{DecisionLockPolicy, StandardLockPolicy};
pub use role::{ReviewContext, ReviewerRole, RoleService};
pub use self_certification::{SelfCertificationChecker, SubjectSelfCertificationChecker};
pub use store::{
    CertificationStore, InMemoryCertificationStore, InMemoryRefreshSink, RefreshSink,
};
pub use visibility::{
    challenge_visibility, delegation_shape, display_status, is_read_only,
    show_delegation_comments, show_delegation_review, show_returned_delegation,
    ChallengeVisibility, DelegationShape,
};
