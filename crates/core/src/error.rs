//! Engine error taxonomy.
//!
//! Expected business conditions are returned as typed errors, never thrown
//! generically: callers translate these to transport-level status codes
//! (404/403/409) at the handler boundary. Only malformed input or a
//! misconfigured collaborator is treated as exceptional.

use carelock_types::{LifecycleState, ResourceType};
use uuid::Uuid;

use crate::lifecycle::TransitionKind;

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The backing account record was deactivated, revoked or deleted since
    /// token issuance. Fatal for the session; the caller must re-authenticate.
    #[error("principal account is inactive or revoked")]
    PrincipalInactive,
    /// No active organization/department assignment covers the resource.
    #[error("out of scope: {0}")]
    OutOfScope(String),
    /// The resource id does not exist at all (distinct from soft-deleted).
    #[error("resource not found")]
    ResourceNotFound,
    /// The requested transition targets a terminal state already reached.
    #[error("resource is already in a terminal state")]
    AlreadyTerminal,
    /// An active legal hold protects the subject against deletion.
    #[error("active compliance hold on {subject_type} {subject_id}")]
    ComplianceBlocked {
        subject_type: ResourceType,
        subject_id: Uuid,
    },
    /// A status-derived business lock (finalized billing, completed lab
    /// result) prevents the transition, independent of any legal hold.
    #[error("record status '{status}' locks this resource")]
    BusinessLocked { status: String },
    /// The resource type does not declare this transition at all.
    #[error("{resource_type} does not support {kind}")]
    UnsupportedTransition {
        resource_type: ResourceType,
        kind: TransitionKind,
    },
    /// The transition is declared for the type but not available from the
    /// resource's current lifecycle state.
    #[error("cannot {kind} a resource in state {state}")]
    StateConflict {
        kind: TransitionKind,
        state: LifecycleState,
    },
    /// The policy evaluator denied the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Storage timeout or contention. Retry-safe: every transition is
    /// idempotent by construction.
    #[error("transient storage failure: {0}")]
    TransientFailure(String),
    /// Malformed caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type GuardResult<T> = std::result::Result<T, GuardError>;
