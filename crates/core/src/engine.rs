//! Engine orchestration.
//!
//! [`PolicyEngine::execute`] is the single entry point request handlers
//! call. It wires the components in dependency order: fetch a fresh
//! snapshot, evaluate policy, plan the lifecycle transition, then commit
//! the mutation and its audit entry as one atomic unit through the storage
//! collaborator.
//!
//! The engine is stateless and request-scoped: it caches nothing between
//! calls, so every decision reflects the state persisted at the moment of
//! the request.

use std::sync::Arc;

use carelock_types::{ActionType, LifecycleState, Principal, ResourceRef};
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditOutcome, AuditRecorder};
use crate::error::{GuardError, GuardResult};
use crate::lifecycle::{plan_transition, SiblingBlockers, TransitionKind, TransitionOutcome};
use crate::policy::{evaluate, DenyReason, PolicyDecision};
use crate::store::{Clock, CommitOutcome, IdGenerator, RecordStore, ResourceSnapshot};

/// A caller's request to perform one action against one record.
///
/// For existing records the engine re-fetches the authoritative descriptor
/// from storage and evaluates against that, not against the caller-supplied
/// fields. For `Create` there is nothing to fetch, so the supplied
/// descriptor (organization, owner, provider of the record-to-be) is
/// evaluated directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: ActionType,
    pub resource: ResourceRef,
}

/// What the engine did with an allowed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// The transition was committed together with its audit entry.
    Applied {
        new_state: LifecycleState,
        audit_id: Uuid,
    },
    /// The resource was already in the requested state (or a concurrent
    /// request got there first). Success, no mutation, no audit entry.
    Idempotent,
    /// A non-mutating action (read, export) or a `Create` was authorized.
    /// Any side effect, and its audit entry for creates, is the caller's
    /// to commit.
    Allowed { decision: PolicyDecision },
}

/// The authorization-and-lifecycle engine.
///
/// Collaborators are injected once at construction; the engine holds no
/// other state. Cheap to clone and share across request handlers.
#[derive(Clone)]
pub struct PolicyEngine {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    recorder: AuditRecorder,
}

impl PolicyEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let recorder = AuditRecorder::new(clock.clone(), ids);
        Self {
            store,
            clock,
            recorder,
        }
    }

    /// Decide and, for state-changing actions, apply one request.
    ///
    /// # Errors
    /// Surfaces the full taxonomy in [`GuardError`](crate::error::GuardError):
    /// policy denials as `OutOfScope`/`Forbidden`, lifecycle rejections as
    /// `ComplianceBlocked`/`BusinessLocked`/`AlreadyTerminal` and friends,
    /// and storage trouble as `TransientFailure`.
    pub fn execute(
        &self,
        principal: &Principal,
        request: &ActionRequest,
    ) -> GuardResult<EngineOutcome> {
        if request.action == ActionType::Create {
            let decision = evaluate(principal, request.action, &request.resource);
            if !decision.is_allow() {
                return Err(self.deny(principal, &request.resource, request.action, decision, None));
            }
            return Ok(EngineOutcome::Allowed { decision });
        }

        let snapshot = self
            .store
            .fetch_snapshot(request.resource.resource_type, request.resource.resource_id)?
            .ok_or(GuardError::ResourceNotFound)?;

        let decision = evaluate(principal, request.action, &snapshot.resource);
        if !decision.is_allow() {
            return Err(self.deny(
                principal,
                &snapshot.resource,
                request.action,
                decision,
                Some(&snapshot.state),
            ));
        }

        let Some(kind) = TransitionKind::for_action(request.action) else {
            tracing::debug!(
                action = %request.action,
                resource = %snapshot.resource.resource_type,
                "allowed non-mutating action"
            );
            return Ok(EngineOutcome::Allowed { decision });
        };

        let (holds, blockers) = if kind.is_delete() {
            (
                self.store.holds_for(
                    snapshot.resource.resource_type,
                    snapshot.resource.resource_id,
                )?,
                self.store.sibling_blockers(&snapshot.resource)?,
            )
        } else {
            (Vec::new(), SiblingBlockers::default())
        };

        let plan = match plan_transition(&snapshot, kind, &holds, &blockers, self.clock.now()) {
            Ok(TransitionOutcome::Idempotent) => return Ok(EngineOutcome::Idempotent),
            Ok(TransitionOutcome::Planned(plan)) => plan,
            Err(err) => {
                // Holds, business locks and terminal states blocking a
                // delete leave the same denied trail as a policy deny.
                self.audit_blocked(principal, &snapshot, request.action, &err);
                return Err(err);
            }
        };

        let entry = self.recorder.entry(AuditEvent {
            actor: principal,
            resource: &snapshot.resource,
            action: request.action,
            outcome: AuditOutcome::Allowed,
            matched_rule: decision.matched_rule,
            reason: None,
            prior_state: Some(&snapshot.state),
            new_state: Some(&plan.new_state),
        });

        match self
            .store
            .commit_transition(&snapshot.resource, &plan, &entry)?
        {
            CommitOutcome::Committed => {
                tracing::debug!(
                    action = %request.action,
                    resource = %snapshot.resource.resource_type,
                    audit_id = %entry.id,
                    "committed lifecycle transition"
                );
                Ok(EngineOutcome::Applied {
                    new_state: plan.new_state,
                    audit_id: entry.id,
                })
            }
            CommitOutcome::StateChanged => {
                self.lost_race(principal, &snapshot, request.action, kind)
            }
            CommitOutcome::HoldImposed => {
                let err = GuardError::ComplianceBlocked {
                    subject_type: snapshot.resource.resource_type,
                    subject_id: snapshot.resource.resource_id,
                };
                self.audit_blocked(principal, &snapshot, request.action, &err);
                Err(err)
            }
        }
    }

    /// Map a lost commit race to the caller-visible outcome. A concurrent
    /// request already moved the state, so the repeat delete/restore is a
    /// no-op and a repeat hard delete finds the row gone.
    fn lost_race(
        &self,
        principal: &Principal,
        snapshot: &ResourceSnapshot,
        action: ActionType,
        kind: TransitionKind,
    ) -> GuardResult<EngineOutcome> {
        match kind {
            TransitionKind::SoftDelete | TransitionKind::Restore => Ok(EngineOutcome::Idempotent),
            TransitionKind::HardDelete => {
                let err = GuardError::AlreadyTerminal;
                self.audit_blocked(principal, snapshot, action, &err);
                Err(err)
            }
            TransitionKind::Update => Err(GuardError::TransientFailure(
                "lifecycle state changed during update".into(),
            )),
        }
    }

    /// Record a lifecycle rejection of a destructive or export attempt.
    /// Best-effort, like policy denials: a failed append is logged rather
    /// than masking the rejection itself.
    fn audit_blocked(
        &self,
        principal: &Principal,
        snapshot: &ResourceSnapshot,
        action: ActionType,
        err: &GuardError,
    ) {
        if !(action.is_destructive() || action == ActionType::Export) {
            return;
        }
        let entry = self.recorder.entry(AuditEvent {
            actor: principal,
            resource: &snapshot.resource,
            action,
            outcome: AuditOutcome::Denied,
            matched_rule: "lifecycle",
            reason: Some(err.to_string()),
            prior_state: Some(&snapshot.state),
            new_state: None,
        });
        if let Err(append_err) = self.store.append_audit(&entry) {
            tracing::warn!(error = %append_err, "failed to record blocked transition");
        }
    }

    /// Record a denied destructive/export attempt and build the error to
    /// surface. The deny entry is best-effort: a failed append is logged
    /// rather than masking the denial itself.
    fn deny(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
        action: ActionType,
        decision: PolicyDecision,
        prior_state: Option<&LifecycleState>,
    ) -> GuardError {
        if action.is_destructive() || action == ActionType::Export {
            let entry = self.recorder.entry(AuditEvent {
                actor: principal,
                resource,
                action,
                outcome: AuditOutcome::Denied,
                matched_rule: decision.matched_rule,
                reason: decision.reason.as_ref().map(|r| r.to_string()),
                prior_state,
                new_state: None,
            });
            if let Err(err) = self.store.append_audit(&entry) {
                tracing::warn!(error = %err, "failed to record denied attempt");
            }
        }

        match decision.reason {
            Some(DenyReason::OutOfScope { detail }) => GuardError::OutOfScope(detail.to_string()),
            Some(reason) => GuardError::Forbidden(reason.to_string()),
            None => GuardError::Forbidden("denied by policy".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SystemClock, UuidGenerator};
    use carelock_types::{AssignmentStatus, OrganizationAssignment, ResourceType, RoleType};

    /// Store stub for paths that must not touch storage at all.
    struct UnreachableStore;

    impl RecordStore for UnreachableStore {
        fn fetch_snapshot(
            &self,
            _resource_type: ResourceType,
            _resource_id: Uuid,
        ) -> GuardResult<Option<ResourceSnapshot>> {
            panic!("create path must not fetch a snapshot");
        }

        fn holds_for(
            &self,
            _subject_type: ResourceType,
            _subject_id: Uuid,
        ) -> GuardResult<Vec<carelock_types::ComplianceHold>> {
            panic!("create path must not query holds");
        }

        fn sibling_blockers(
            &self,
            _resource: &ResourceRef,
        ) -> GuardResult<SiblingBlockers> {
            panic!("create path must not query blockers");
        }

        fn commit_transition(
            &self,
            _resource: &ResourceRef,
            _plan: &crate::lifecycle::TransitionPlan,
            _audit: &carelock_types::AuditLogEntry,
        ) -> GuardResult<CommitOutcome> {
            panic!("create path must not commit");
        }

        fn append_audit(&self, _entry: &carelock_types::AuditLogEntry) -> GuardResult<()> {
            Ok(())
        }
    }

    #[test]
    fn create_is_authorized_without_a_snapshot() {
        let engine = PolicyEngine::new(
            Arc::new(UnreachableStore),
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
        );
        let org = Uuid::new_v4();
        let patient = Principal {
            id: Uuid::new_v4(),
            role: RoleType::Patient,
            assignments: vec![OrganizationAssignment {
                organization_id: org,
                department_id: None,
                status: AssignmentStatus::Active,
            }],
        };
        let request = ActionRequest {
            action: ActionType::Create,
            resource: ResourceRef {
                resource_type: ResourceType::Appointment,
                resource_id: Uuid::new_v4(),
                organization_id: org,
                department_id: None,
                owner_id: Some(patient.id),
                assigned_provider_id: None,
            },
        };

        let outcome = engine.execute(&patient, &request).unwrap();
        assert!(matches!(outcome, EngineOutcome::Allowed { .. }));
    }

    #[test]
    fn denied_create_surfaces_forbidden() {
        let engine = PolicyEngine::new(
            Arc::new(UnreachableStore),
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
        );
        let patient = Principal {
            id: Uuid::new_v4(),
            role: RoleType::Patient,
            assignments: vec![],
        };
        // Patients cannot create lab results at all.
        let request = ActionRequest {
            action: ActionType::Create,
            resource: ResourceRef {
                resource_type: ResourceType::LabResult,
                resource_id: Uuid::new_v4(),
                organization_id: Uuid::new_v4(),
                department_id: None,
                owner_id: Some(patient.id),
                assigned_provider_id: None,
            },
        };

        let err = engine.execute(&patient, &request).unwrap_err();
        assert!(matches!(err, GuardError::Forbidden(_)));
    }
}
