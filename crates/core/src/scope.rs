//! Scope resolution.
//!
//! Scope is the organizational boundary a principal may act within. It is
//! derived *exclusively* from active organization assignments: the absence
//! of an assignment record is always out of scope, never an implicit
//! allow, and a principal's own id is never interpreted as an organization
//! id.
//!
//! Role semantics:
//! - `SystemAdmin` acts platform-wide with no assignment row.
//! - `OrganizationAdmin` needs an active assignment to the resource's
//!   organization.
//! - `DepartmentHead` additionally needs a department match.
//! - Clinical roles (`MedicalDoctor`, `Nurse`) need organization membership
//!   *and*, for clinical record types, must be the assigned provider of or
//!   a participant in the resource. For user-owned types (dashboard
//!   preferences, MFA factors, reminders) membership suffices here; the
//!   ownership/self-only predicates gate access downstream.
//! - `Technician` and `Receptionist` need organization membership.
//! - `Patient` needs an active link to the resource's organization and may
//!   only act on resources they own.

use carelock_types::{OrganizationAssignment, Principal, ResourceRef, RoleType};

/// Outcome of scope resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    InScope {
        /// The assignment that granted scope. `None` only for platform
        /// admins, whose scope is not assignment-backed.
        matched: Option<OrganizationAssignment>,
    },
    OutOfScope {
        detail: &'static str,
    },
}

impl ScopeDecision {
    pub fn is_in_scope(&self) -> bool {
        matches!(self, ScopeDecision::InScope { .. })
    }
}

/// Determine whether `resource` falls inside `principal`'s scope.
pub fn resolve_scope(principal: &Principal, resource: &ResourceRef) -> ScopeDecision {
    match principal.role {
        RoleType::SystemAdmin => ScopeDecision::InScope { matched: None },
        RoleType::OrganizationAdmin | RoleType::Technician | RoleType::Receptionist => {
            match_assignment(principal, resource, false)
        }
        RoleType::DepartmentHead => match_assignment(principal, resource, true),
        RoleType::MedicalDoctor | RoleType::Nurse => {
            match match_assignment(principal, resource, false) {
                ScopeDecision::InScope { matched } => {
                    // Participation only narrows clinical records; ownership
                    // of dashboards, reminders and MFA factors is checked by
                    // the predicate layer, not here.
                    if !resource.resource_type.is_clinical() || is_participant(principal, resource)
                    {
                        ScopeDecision::InScope { matched }
                    } else {
                        ScopeDecision::OutOfScope {
                            detail: "principal is not the assigned provider or a participant",
                        }
                    }
                }
                out_of_scope => out_of_scope,
            }
        }
        RoleType::Patient => {
            if resource.owner_id != Some(principal.id) {
                return ScopeDecision::OutOfScope {
                    detail: "patients may only act on resources they own",
                };
            }
            // Ownership alone is not scope: the patient must also hold an
            // active link to the organization the record lives in.
            match_assignment(principal, resource, false)
        }
    }
}

/// Find an active assignment covering the resource's organization (and
/// department, when `require_department` is set).
fn match_assignment(
    principal: &Principal,
    resource: &ResourceRef,
    require_department: bool,
) -> ScopeDecision {
    for assignment in principal.active_assignments() {
        if assignment.organization_id != resource.organization_id {
            continue;
        }

        if require_department {
            // Department heads only cover resources in their own department.
            match (assignment.department_id, resource.department_id) {
                (Some(head_dept), Some(resource_dept)) if head_dept == resource_dept => {
                    return ScopeDecision::InScope {
                        matched: Some(assignment.clone()),
                    };
                }
                _ => continue,
            }
        }

        // A department-scoped assignment does not cover resources filed
        // under a different department.
        if let (Some(assigned_dept), Some(resource_dept)) =
            (assignment.department_id, resource.department_id)
        {
            if assigned_dept != resource_dept {
                continue;
            }
        }

        return ScopeDecision::InScope {
            matched: Some(assignment.clone()),
        };
    }

    ScopeDecision::OutOfScope {
        detail: "no active assignment covers the resource organization",
    }
}

fn is_participant(principal: &Principal, resource: &ResourceRef) -> bool {
    resource.assigned_provider_id == Some(principal.id) || resource.owner_id == Some(principal.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelock_types::{AssignmentStatus, ResourceType};
    use uuid::Uuid;

    fn principal(role: RoleType, assignments: Vec<OrganizationAssignment>) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            role,
            assignments,
        }
    }

    fn assignment(
        org: Uuid,
        dept: Option<Uuid>,
        status: AssignmentStatus,
    ) -> OrganizationAssignment {
        OrganizationAssignment {
            organization_id: org,
            department_id: dept,
            status,
        }
    }

    fn resource(org: Uuid) -> ResourceRef {
        ResourceRef {
            resource_type: ResourceType::Appointment,
            resource_id: Uuid::new_v4(),
            organization_id: org,
            department_id: None,
            owner_id: None,
            assigned_provider_id: None,
        }
    }

    #[test]
    fn system_admin_is_always_in_scope() {
        let admin = principal(RoleType::SystemAdmin, vec![]);
        assert!(resolve_scope(&admin, &resource(Uuid::new_v4())).is_in_scope());
    }

    #[test]
    fn org_admin_outside_assigned_org_is_out_of_scope() {
        let org_a = Uuid::new_v4();
        let org_b = Uuid::new_v4();
        let admin = principal(
            RoleType::OrganizationAdmin,
            vec![assignment(org_a, None, AssignmentStatus::Active)],
        );
        assert!(!resolve_scope(&admin, &resource(org_b)).is_in_scope());
    }

    #[test]
    fn inactive_assignment_never_matches() {
        let org = Uuid::new_v4();
        let admin = principal(
            RoleType::OrganizationAdmin,
            vec![assignment(org, None, AssignmentStatus::Inactive)],
        );
        assert!(!resolve_scope(&admin, &resource(org)).is_in_scope());
    }

    #[test]
    fn no_assignments_is_out_of_scope_not_implicit_allow() {
        let admin = principal(RoleType::OrganizationAdmin, vec![]);
        let target = resource(admin.id);
        // The principal's own id used as an organization id must not match.
        assert!(!resolve_scope(&admin, &target).is_in_scope());
    }

    #[test]
    fn department_head_needs_department_match() {
        let org = Uuid::new_v4();
        let dept_a = Uuid::new_v4();
        let dept_b = Uuid::new_v4();
        let head = principal(
            RoleType::DepartmentHead,
            vec![assignment(org, Some(dept_a), AssignmentStatus::Active)],
        );

        let mut in_dept = resource(org);
        in_dept.department_id = Some(dept_a);
        assert!(resolve_scope(&head, &in_dept).is_in_scope());

        let mut other_dept = resource(org);
        other_dept.department_id = Some(dept_b);
        assert!(!resolve_scope(&head, &other_dept).is_in_scope());

        // Resources with no department are outside a departmental remit.
        assert!(!resolve_scope(&head, &resource(org)).is_in_scope());
    }

    #[test]
    fn doctor_needs_membership_and_participation() {
        let org = Uuid::new_v4();
        let doctor = principal(
            RoleType::MedicalDoctor,
            vec![assignment(org, None, AssignmentStatus::Active)],
        );

        let mut assigned = resource(org);
        assigned.assigned_provider_id = Some(doctor.id);
        assert!(resolve_scope(&doctor, &assigned).is_in_scope());

        let unassigned = resource(org);
        assert!(!resolve_scope(&doctor, &unassigned).is_in_scope());
    }

    #[test]
    fn doctor_assigned_but_outside_org_is_out_of_scope() {
        let doctor = principal(RoleType::MedicalDoctor, vec![]);
        let mut target = resource(Uuid::new_v4());
        target.assigned_provider_id = Some(doctor.id);
        assert!(!resolve_scope(&doctor, &target).is_in_scope());
    }

    #[test]
    fn nurse_reaches_own_dashboard_without_provider_assignment() {
        let org = Uuid::new_v4();
        let nurse = principal(
            RoleType::Nurse,
            vec![assignment(org, None, AssignmentStatus::Active)],
        );

        // Nobody is ever the "assigned provider" of a dashboard preference;
        // membership alone establishes scope for user-owned types.
        let mut dashboard = resource(org);
        dashboard.resource_type = ResourceType::DashboardPreference;
        dashboard.owner_id = Some(nurse.id);
        assert!(resolve_scope(&nurse, &dashboard).is_in_scope());

        let mut factor = resource(org);
        factor.resource_type = ResourceType::MfaFactor;
        factor.owner_id = Some(nurse.id);
        assert!(resolve_scope(&nurse, &factor).is_in_scope());

        // Clinical records still demand participation.
        assert!(!resolve_scope(&nurse, &resource(org)).is_in_scope());
    }

    #[test]
    fn patient_only_owns_their_records() {
        let org = Uuid::new_v4();
        let patient = principal(
            RoleType::Patient,
            vec![assignment(org, None, AssignmentStatus::Active)],
        );

        let mut own = resource(org);
        own.owner_id = Some(patient.id);
        assert!(resolve_scope(&patient, &own).is_in_scope());

        let mut other = resource(org);
        other.owner_id = Some(Uuid::new_v4());
        assert!(!resolve_scope(&patient, &other).is_in_scope());
    }

    #[test]
    fn patient_owner_outside_their_organization_is_out_of_scope() {
        let patient = principal(RoleType::Patient, vec![]);

        // Owning the record is not enough; without an active link to its
        // organization the patient stays out of scope.
        let mut own = resource(Uuid::new_v4());
        own.owner_id = Some(patient.id);
        assert!(!resolve_scope(&patient, &own).is_in_scope());
    }
}
