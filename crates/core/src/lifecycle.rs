//! Lifecycle guard.
//!
//! Given an allowed action, the guard computes the resource's state
//! transition or rejects it. The output is a pure data description of the
//! mutation to apply; the actual write is the storage collaborator's
//! responsibility, which keeps the engine storage-agnostic.
//!
//! Checks run in a fixed order:
//! 1. the transition must be declared for the resource type,
//! 2. a transition targeting the state already reached is idempotent
//!    (soft delete, restore) or terminal (hard delete),
//! 3. an active compliance hold forbids any delete transition, for every
//!    role including platform administrators,
//! 4. declared sibling blockers (a non-draft invoice referencing an
//!    appointment, a held patient record linked to a medical image),
//! 5. a finalized business status locks the record against deletion.

use carelock_types::{ComplianceHold, LifecycleState, RecordStatus, ResourceType};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{GuardError, GuardResult};
use crate::store::ResourceSnapshot;

/// The state transitions the guard can be asked to plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    SoftDelete,
    HardDelete,
    Restore,
    Update,
}

impl TransitionKind {
    /// The transition an action implies, or `None` for actions that do not
    /// touch lifecycle state (read, export, create).
    pub fn for_action(action: carelock_types::ActionType) -> Option<Self> {
        match action {
            carelock_types::ActionType::SoftDelete => Some(TransitionKind::SoftDelete),
            carelock_types::ActionType::HardDelete => Some(TransitionKind::HardDelete),
            carelock_types::ActionType::Restore => Some(TransitionKind::Restore),
            carelock_types::ActionType::Update => Some(TransitionKind::Update),
            carelock_types::ActionType::Read
            | carelock_types::ActionType::Create
            | carelock_types::ActionType::Export => None,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, TransitionKind::SoftDelete | TransitionKind::HardDelete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::SoftDelete => "soft_delete",
            TransitionKind::HardDelete => "hard_delete",
            TransitionKind::Restore => "restore",
            TransitionKind::Update => "update",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure description of the conditional write a transition requires.
///
/// Every variant describes an *atomic, conditional* mutation: the store
/// must apply it only while the precondition still holds (for example,
/// "set `deleted_at` where `deleted_at IS NULL`"), so that two concurrent
/// requests serialize into one applied transition and one observed
/// state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateMutation {
    /// Set `deleted_at` where it is currently null.
    MarkDeleted { deleted_at: DateTime<Utc> },
    /// Physically remove the row (and write a tombstone if the store keeps
    /// them). Irreversible.
    PurgeRow,
    /// Clear `deleted_at` where it is currently set.
    ClearDeleted,
    /// No lifecycle change. The caller's own field updates join the same
    /// transaction as the audit entry.
    FieldsOnly,
}

/// A planned transition: the state the resource will be in afterwards and
/// the mutation that takes it there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub new_state: LifecycleState,
    pub mutation: StateMutation,
}

/// Outcome of planning: either a concrete plan, or nothing to do because
/// the resource is already in the requested state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Planned(TransitionPlan),
    /// The target state is already reached. Success with no mutation, no
    /// audit entry, and no duplicate side effects.
    Idempotent,
}

/// Sibling-entity state that can block a deletion, fetched by the caller
/// within the same request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiblingBlockers {
    /// Status of a billing invoice referencing the resource, if any.
    /// Non-draft invoices block appointment deletion.
    pub referencing_invoice: Option<RecordStatus>,
    /// Id of a linked patient record currently under an active hold or
    /// compliance lock. Blocks medical image deletion.
    pub held_linked_record: Option<Uuid>,
}

/// Plan the requested transition against a fresh snapshot.
///
/// `holds` and `blockers` must have been fetched within the current
/// request; the commit step re-verifies both inside the storage
/// transaction, so a hold imposed between this check and the write still
/// blocks the mutation.
///
/// # Errors
/// - `UnsupportedTransition` if the type does not declare the transition.
/// - `AlreadyTerminal` if the resource is hard-deleted.
/// - `StateConflict` for an update against a soft-deleted resource.
/// - `ComplianceBlocked` if an active hold protects the resource or a
///   linked record.
/// - `BusinessLocked` if a finalized status or a non-draft referencing
///   invoice locks the record.
pub fn plan_transition(
    snapshot: &ResourceSnapshot,
    kind: TransitionKind,
    holds: &[ComplianceHold],
    blockers: &SiblingBlockers,
    now: DateTime<Utc>,
) -> GuardResult<TransitionOutcome> {
    let resource_type = snapshot.resource.resource_type;

    match kind {
        TransitionKind::SoftDelete | TransitionKind::Restore
            if !resource_type.supports_soft_delete() =>
        {
            return Err(GuardError::UnsupportedTransition {
                resource_type,
                kind,
            });
        }
        TransitionKind::HardDelete if !resource_type.supports_hard_delete() => {
            return Err(GuardError::UnsupportedTransition {
                resource_type,
                kind,
            });
        }
        _ => {}
    }

    match (kind, &snapshot.state) {
        (TransitionKind::SoftDelete, LifecycleState::SoftDeleted { .. }) => {
            return Ok(TransitionOutcome::Idempotent);
        }
        (TransitionKind::Restore, LifecycleState::Active) => {
            return Ok(TransitionOutcome::Idempotent);
        }
        (_, LifecycleState::HardDeleted) => {
            return Err(GuardError::AlreadyTerminal);
        }
        (TransitionKind::Update, LifecycleState::SoftDeleted { .. }) => {
            return Err(GuardError::StateConflict {
                kind,
                state: snapshot.state.clone(),
            });
        }
        _ => {}
    }

    if kind.is_delete() {
        if let Some(hold) = holds.iter().find(|h| h.is_active()) {
            return Err(GuardError::ComplianceBlocked {
                subject_type: hold.subject_type,
                subject_id: hold.subject_id,
            });
        }

        if resource_type == ResourceType::Appointment {
            if let Some(invoice_status) = &blockers.referencing_invoice {
                if !invoice_status.is_draft() {
                    return Err(GuardError::BusinessLocked {
                        status: invoice_status.as_str().to_string(),
                    });
                }
            }
        }

        if resource_type == ResourceType::MedicalImage {
            if let Some(record_id) = blockers.held_linked_record {
                return Err(GuardError::ComplianceBlocked {
                    subject_type: ResourceType::PatientRecord,
                    subject_id: record_id,
                });
            }
        }

        if let Some(status) = &snapshot.status {
            if status.is_finalized() {
                return Err(GuardError::BusinessLocked {
                    status: status.as_str().to_string(),
                });
            }
        }
    }

    let plan = match kind {
        TransitionKind::SoftDelete => TransitionPlan {
            new_state: LifecycleState::SoftDeleted { deleted_at: now },
            mutation: StateMutation::MarkDeleted { deleted_at: now },
        },
        TransitionKind::HardDelete => TransitionPlan {
            new_state: LifecycleState::HardDeleted,
            mutation: StateMutation::PurgeRow,
        },
        TransitionKind::Restore => TransitionPlan {
            new_state: LifecycleState::Active,
            mutation: StateMutation::ClearDeleted,
        },
        TransitionKind::Update => TransitionPlan {
            new_state: LifecycleState::Active,
            mutation: StateMutation::FieldsOnly,
        },
    };

    Ok(TransitionOutcome::Planned(plan))
}
