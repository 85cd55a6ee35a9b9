//! Audit recording.
//!
//! Every allowed decision that changes lifecycle state produces exactly
//! one [`AuditLogEntry`], committed atomically with the mutation by the
//! storage collaborator. Denied delete and export attempts are recorded
//! too, for forensic completeness. Entries are structured — no handler
//! ever assembles ad hoc JSON context by hand.

use std::sync::Arc;

use carelock_types::{ActionType, AuditLogEntry, LifecycleState, Principal, ResourceRef};
use serde_json::json;

use crate::store::{Clock, IdGenerator};

/// Whether the audited decision allowed or denied the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Allowed,
    Denied,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Allowed => "allowed",
            AuditOutcome::Denied => "denied",
        }
    }
}

/// A structured decision event, before id and timestamp assignment.
#[derive(Debug, Clone)]
pub struct AuditEvent<'a> {
    pub actor: &'a Principal,
    pub resource: &'a ResourceRef,
    pub action: ActionType,
    pub outcome: AuditOutcome,
    /// Rule layer that settled the decision.
    pub matched_rule: &'static str,
    /// Deny reason, rendered for the trail. `None` on allows.
    pub reason: Option<String>,
    /// Lifecycle state before the transition, where one was consulted.
    pub prior_state: Option<&'a LifecycleState>,
    /// Lifecycle state after the transition, for allowed state changes.
    pub new_state: Option<&'a LifecycleState>,
}

/// Builds immutable audit entries from structured events.
///
/// Write-only by design: the recorder never reads the log back within a
/// request.
#[derive(Clone)]
pub struct AuditRecorder {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl AuditRecorder {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// Assemble the entry for one decision event.
    pub fn entry(&self, event: AuditEvent<'_>) -> AuditLogEntry {
        AuditLogEntry {
            id: self.ids.next_id(),
            actor_id: event.actor.id,
            organization_id: event.resource.organization_id,
            action: event.action,
            entity_type: event.resource.resource_type,
            entity_id: event.resource.resource_id,
            timestamp: self.clock.now(),
            context: json!({
                "outcome": event.outcome.as_str(),
                "matched_rule": event.matched_rule,
                "reason": event.reason,
                "actor_role": event.actor.role.as_str(),
                "prior_state": event.prior_state,
                "new_state": event.new_state,
            }),
        }
    }
}
