//! Policy evaluation.
//!
//! A single parameterized evaluator replaces per-handler authorization
//! checks. It combines three layers, evaluated in order, with the first
//! failing layer short-circuiting into a specific deny reason:
//!
//! 1. **Role capability** — a static `role × action × resource type` table.
//!    A role that can never perform the action on the type is rejected
//!    before any storage-backed state is consulted.
//! 2. **Scope** — organization/department membership via [`resolve_scope`].
//! 3. **Resource predicates** — ownership, provider assignment, or
//!    self-only access, required wherever the capability is `Conditional`.
//!
//! Deny reasons are part of the audit trail, not just debugging output.

use carelock_types::{ActionType, Principal, ResourceRef, ResourceType, RoleType};

use crate::scope::{resolve_scope, ScopeDecision};

/// What the capability table says about a `(role, action, resource type)`
/// combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Permitted, subject only to scope.
    Allowed,
    /// Permitted, subject to scope and a resource predicate.
    Conditional,
    /// Never permitted for this role.
    Denied,
}

/// The closed set of resource-specific predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// The acting principal must equal the stored owner/submitter id.
    Ownership,
    /// The acting clinician must equal the resource's assigned provider.
    Assignment,
    /// The principal may only touch their own records, regardless of any
    /// requested filter (MFA factors).
    SelfOnly,
}

impl Predicate {
    pub fn rule_name(&self) -> &'static str {
        match self {
            Predicate::Ownership => "predicate/ownership",
            Predicate::Assignment => "predicate/assignment",
            Predicate::SelfOnly => "predicate/self-only",
        }
    }

    fn check(&self, principal: &Principal, resource: &ResourceRef) -> Result<(), DenyReason> {
        match self {
            Predicate::Ownership => {
                if resource.owner_id == Some(principal.id) {
                    Ok(())
                } else {
                    Err(DenyReason::NotOwner)
                }
            }
            Predicate::Assignment => {
                if resource.assigned_provider_id == Some(principal.id) {
                    Ok(())
                } else {
                    Err(DenyReason::NotAssignedProvider)
                }
            }
            Predicate::SelfOnly => {
                if resource.owner_id == Some(principal.id) {
                    Ok(())
                } else {
                    Err(DenyReason::NotSelf)
                }
            }
        }
    }
}

/// Why an action was denied. Rendered into the audit context verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    RoleCapability {
        role: RoleType,
        action: ActionType,
        resource_type: ResourceType,
    },
    OutOfScope {
        detail: &'static str,
    },
    NotOwner,
    NotAssignedProvider,
    NotSelf,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::RoleCapability {
                role,
                action,
                resource_type,
            } => write!(f, "role {role} may not {action} {resource_type}"),
            DenyReason::OutOfScope { detail } => write!(f, "out of scope: {detail}"),
            DenyReason::NotOwner => f.write_str("principal does not own the resource"),
            DenyReason::NotAssignedProvider => {
                f.write_str("principal is not the assigned provider")
            }
            DenyReason::NotSelf => f.write_str("mfa factors may only be accessed by their owner"),
        }
    }
}

/// Allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// The evaluator's verdict for one `(principal, action, resource)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub decision: Decision,
    /// Present exactly when the decision is `Deny`.
    pub reason: Option<DenyReason>,
    /// Identifier of the rule layer that settled the decision.
    pub matched_rule: &'static str,
}

impl PolicyDecision {
    fn allow(matched_rule: &'static str) -> Self {
        Self {
            decision: Decision::Allow,
            reason: None,
            matched_rule,
        }
    }

    fn deny(reason: DenyReason, matched_rule: &'static str) -> Self {
        Self {
            decision: Decision::Deny,
            reason: Some(reason),
            matched_rule,
        }
    }

    pub fn is_allow(&self) -> bool {
        self.decision == Decision::Allow
    }
}

/// The static role capability table.
///
/// This is the single source of truth for what a role can ever do; scope
/// and predicates narrow it further. Lifecycle rules (holds, business
/// locks, terminal states) are enforced downstream by the lifecycle guard
/// and apply even to combinations listed `Allowed` here.
pub fn capability(role: RoleType, action: ActionType, resource: ResourceType) -> Capability {
    use ActionType::*;
    use Capability::*;
    use ResourceType::*;

    match role {
        // Platform administrators hold every capability; compliance holds
        // and business locks still bind them downstream.
        RoleType::SystemAdmin => Allowed,

        RoleType::OrganizationAdmin => match (action, resource) {
            (Read | Create | Update | SoftDelete | Restore, _) => Allowed,
            (HardDelete, MedicalImage | MfaFactor) => Allowed,
            (HardDelete, _) => Denied,
            (Export, PatientRecord | LabResult | InsuranceClaim | BillingInvoice) => Allowed,
            (Export, _) => Denied,
        },

        RoleType::DepartmentHead => match (action, resource) {
            (Read, _) => Allowed,
            (
                Create | Update,
                Appointment | Encounter | LabResult | VitalsRecord | Reminder
                | TelemedicineSession,
            ) => Allowed,
            (SoftDelete | Restore, Appointment | Encounter | LabResult | Reminder) => Allowed,
            (Export, LabResult) => Allowed,
            _ => Denied,
        },

        RoleType::MedicalDoctor => match (action, resource) {
            (
                Read | Create | Update,
                Appointment | Encounter | TelemedicineSession | VitalsRecord | LabResult,
            ) => Conditional,
            (Read, PatientRecord | MedicalImage) => Conditional,
            (SoftDelete, Appointment | LabResult | Reminder) => Conditional,
            (Create | Update, Amendment) => Conditional,
            (Read | Create | Update, Reminder) => Conditional,
            (Read | Update, DashboardPreference) => Conditional,
            (Read | HardDelete, MfaFactor) => Conditional,
            (Export, LabResult) => Conditional,
            _ => Denied,
        },

        RoleType::Nurse => match (action, resource) {
            (Read | Update, Appointment | Encounter | VitalsRecord | LabResult) => Conditional,
            (Create, VitalsRecord | Reminder) => Conditional,
            (Read, PatientRecord) => Conditional,
            (Read | Update | SoftDelete, Reminder) => Conditional,
            (Read | Update, DashboardPreference) => Conditional,
            (Read | HardDelete, MfaFactor) => Conditional,
            _ => Denied,
        },

        RoleType::Technician => match (action, resource) {
            (Read | Create | Update, LabResult | MedicalImage) => Conditional,
            (Read, Appointment) => Allowed,
            (Read | Update, DashboardPreference) => Conditional,
            (Read | HardDelete, MfaFactor) => Conditional,
            _ => Denied,
        },

        RoleType::Receptionist => match (action, resource) {
            (Read | Create | Update | SoftDelete, Appointment | Reminder) => Allowed,
            (Restore, Appointment) => Allowed,
            (Read, PatientRecord) => Allowed,
            (Read | Update, DashboardPreference) => Conditional,
            (Read | HardDelete, MfaFactor) => Conditional,
            _ => Denied,
        },

        RoleType::Patient => match (action, resource) {
            (
                Read | Export,
                PatientRecord | LabResult | MedicalImage | Appointment | BillingInvoice
                | InsuranceClaim,
            ) => Conditional,
            (Create | Update | SoftDelete, Appointment) => Conditional,
            (Read | Update, DashboardPreference) => Conditional,
            (Create, Amendment) => Conditional,
            (Read | Create | HardDelete, MfaFactor) => Conditional,
            _ => Denied,
        },
    }
}

/// Select the predicate backing a `Conditional` capability.
fn conditional_predicate(role: RoleType, resource: ResourceType) -> Predicate {
    match resource {
        ResourceType::MfaFactor => Predicate::SelfOnly,
        ResourceType::DashboardPreference | ResourceType::Amendment | ResourceType::Reminder => {
            Predicate::Ownership
        }
        _ => match role {
            RoleType::Patient => Predicate::Ownership,
            _ => Predicate::Assignment,
        },
    }
}

/// Evaluate `(principal, action, resource)` into a [`PolicyDecision`].
///
/// Capability is checked first for a fast reject, then scope, then any
/// resource predicate. All layers must pass for `Allow`.
pub fn evaluate(
    principal: &Principal,
    action: ActionType,
    resource: &ResourceRef,
) -> PolicyDecision {
    let cap = capability(principal.role, action, resource.resource_type);
    if cap == Capability::Denied {
        return PolicyDecision::deny(
            DenyReason::RoleCapability {
                role: principal.role,
                action,
                resource_type: resource.resource_type,
            },
            "capability",
        );
    }

    match resolve_scope(principal, resource) {
        ScopeDecision::OutOfScope { detail } => {
            PolicyDecision::deny(DenyReason::OutOfScope { detail }, "scope")
        }
        ScopeDecision::InScope { .. } => {
            if cap == Capability::Conditional {
                let predicate = conditional_predicate(principal.role, resource.resource_type);
                match predicate.check(principal, resource) {
                    Ok(()) => PolicyDecision::allow(predicate.rule_name()),
                    Err(reason) => PolicyDecision::deny(reason, predicate.rule_name()),
                }
            } else {
                PolicyDecision::allow("capability")
            }
        }
    }
}
