//! Storage, clock and id-generation collaborators.
//!
//! The engine owns no persistence of its own. Everything it needs is
//! injected through the traits here, resolved once at startup and passed
//! into [`PolicyEngine::new`](crate::engine::PolicyEngine::new) — never a
//! process-wide singleton. This keeps evaluation deterministic in tests
//! and avoids reading ambient state during request handling.

use carelock_types::{
    AuditLogEntry, ComplianceHold, LifecycleState, RecordStatus, ResourceRef, ResourceType,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GuardResult;
use crate::lifecycle::{SiblingBlockers, TransitionPlan};

/// A record's current persisted state, fetched fresh for one decision.
///
/// Snapshots must never be cached across requests: a decision taken on a
/// stale snapshot is a time-of-check/time-of-use hole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub resource: ResourceRef,
    pub state: LifecycleState,
    /// Business status column, where the type carries one.
    pub status: Option<RecordStatus>,
}

/// How an attempted commit resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The conditional write matched and both the mutation and the audit
    /// entry were committed in one transaction.
    Committed,
    /// The precondition no longer held: a concurrent request already moved
    /// the resource's lifecycle state. Nothing was written, including the
    /// audit entry.
    StateChanged,
    /// A compliance hold was imposed on the resource between the guard's
    /// check and the write. Nothing was written.
    HoldImposed,
}

/// Storage collaborator for record snapshots, holds and transition commits.
///
/// All calls are expected to carry caller-supplied timeouts; on timeout an
/// implementation surfaces `GuardError::TransientFailure`, which is safe to
/// retry because every transition is idempotent.
pub trait RecordStore: Send + Sync {
    /// Fetch the current snapshot for a record, or `None` if no row exists.
    ///
    /// Soft-deleted rows are returned (with their `SoftDeleted` state);
    /// only physically absent rows yield `None`.
    fn fetch_snapshot(
        &self,
        resource_type: ResourceType,
        resource_id: Uuid,
    ) -> GuardResult<Option<ResourceSnapshot>>;

    /// All holds referencing the subject. The engine filters for active
    /// ones; returning released holds as well is fine.
    fn holds_for(
        &self,
        subject_type: ResourceType,
        subject_id: Uuid,
    ) -> GuardResult<Vec<ComplianceHold>>;

    /// Sibling-entity state that can block deletion of `resource`
    /// (referencing invoices, held linked records).
    fn sibling_blockers(&self, resource: &ResourceRef) -> GuardResult<SiblingBlockers>;

    /// Apply the planned mutation and append the audit entry as a single
    /// atomic unit.
    ///
    /// The implementation must re-verify the plan's precondition inside
    /// the transaction: the state condition of the mutation (for example
    /// `deleted_at IS NULL` for a soft delete) and the absence of a newly
    /// imposed active hold. If either fails, nothing is written and the
    /// corresponding [`CommitOutcome`] is returned — a lost race must
    /// never produce a second audit entry.
    fn commit_transition(
        &self,
        resource: &ResourceRef,
        plan: &TransitionPlan,
        audit: &AuditLogEntry,
    ) -> GuardResult<CommitOutcome>;

    /// Append an audit entry with no accompanying mutation (denied
    /// destructive/export attempts).
    fn append_audit(&self, entry: &AuditLogEntry) -> GuardResult<()>;
}

/// Time source. Injected so tests can pin the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Id source for audit entries. Injected so tests can use sequential ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn uuid_generator_produces_distinct_ids() {
        let ids = UuidGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
