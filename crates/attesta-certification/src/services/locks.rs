//! Phase-lock and revoke-lock predicates.
//!
//! Whether an existing decision may still be changed is a per-deployment
//! business rule, so the engine consumes it through the
//! [`DecisionLockPolicy`] trait. [`StandardLockPolicy`] carries the stock
//! rules: decisions freeze once the challenge window has passed, and
//! launched remediations can no longer be taken back.

use crate::types::{
    requires_review, Certification, CertificationAction, CertificationDelegation,
    CertificationPhase, DecisionStatus, normalize_display_status,
};

/// Pluggable decision-lock rules.
pub trait DecisionLockPolicy: Send + Sync {
    /// Whether the current phase forbids changing the item's decision.
    fn is_decision_locked_by_phase(
        &self,
        certification: &Certification,
        action: Option<&CertificationAction>,
        phase: CertificationPhase,
    ) -> bool;

    /// Whether revocation processing forbids changing the item's decision.
    fn is_decision_locked_by_revokes(
        &self,
        certification: &Certification,
        item_delegation: Option<&CertificationDelegation>,
        entity_delegation: Option<&CertificationDelegation>,
        action: Option<&CertificationAction>,
    ) -> bool;
}

/// The stock lock rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLockPolicy;

impl DecisionLockPolicy for StandardLockPolicy {
    fn is_decision_locked_by_phase(
        &self,
        certification: &Certification,
        action: Option<&CertificationAction>,
        phase: CertificationPhase,
    ) -> bool {
        // New decisions are always allowed; only changes are locked, and
        // only when a challenge or remediation window exists at all.
        let Some(action) = action else {
            return false;
        };
        let either_enabled = certification.is_phase_enabled(CertificationPhase::Challenge)
            || certification.is_phase_enabled(CertificationPhase::Remediation);
        if !either_enabled {
            return false;
        }

        if phase > CertificationPhase::Challenge {
            return true;
        }

        // During the challenge window a revocation is already in front of
        // the affected user and cannot be withdrawn.
        phase == CertificationPhase::Challenge
            && normalize_display_status(action).is_remediation()
    }

    fn is_decision_locked_by_revokes(
        &self,
        certification: &Certification,
        item_delegation: Option<&CertificationDelegation>,
        entity_delegation: Option<&CertificationDelegation>,
        action: Option<&CertificationAction>,
    ) -> bool {
        let Some(action) = action else {
            return false;
        };

        // Once the remediation request has gone out there is no way back.
        if action.remediation_kicked_off {
            return true;
        }

        if !certification.process_revokes_immediately {
            return false;
        }

        // A decision still under delegation review has not been flushed yet
        // and may still change.
        if requires_review(Some(action), item_delegation, entity_delegation) {
            return false;
        }

        match normalize_display_status(action) {
            DecisionStatus::Remediated | DecisionStatus::RevokeAccount => true,
            DecisionStatus::Approved => action.additional_provisioning,
            _ => false,
        }
    }
}
