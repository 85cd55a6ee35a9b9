//! Principals and organization membership.
//!
//! A [`Principal`] is the authenticated actor attempting an action. It is
//! constructed once per request from the live account record (never from
//! token claims alone) and is immutable for the lifetime of that request.
//! It is never persisted beyond the session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of roles recognised by the platform.
///
/// Role names map one-to-one onto the role claim carried in the verified
/// identity token. The set is deliberately closed: capability rules are
/// written per role, and an unknown role must fail at deserialization
/// rather than fall through to a default rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    SystemAdmin,
    OrganizationAdmin,
    DepartmentHead,
    MedicalDoctor,
    Nurse,
    Technician,
    Receptionist,
    Patient,
}

impl RoleType {
    /// Human-readable role name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::SystemAdmin => "system_admin",
            RoleType::OrganizationAdmin => "organization_admin",
            RoleType::DepartmentHead => "department_head",
            RoleType::MedicalDoctor => "medical_doctor",
            RoleType::Nurse => "nurse",
            RoleType::Technician => "technician",
            RoleType::Receptionist => "receptionist",
            RoleType::Patient => "patient",
        }
    }
}

impl std::fmt::Display for RoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an organization assignment is currently in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

/// A principal's membership of one organization, optionally narrowed to a
/// department.
///
/// Assignments are the *sole* source of truth for scope: a principal with
/// no active assignment covering a resource's organization is out of scope
/// for that resource, whatever their role. In particular a principal's own
/// id is never interpreted as an organization id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationAssignment {
    pub organization_id: Uuid,
    pub department_id: Option<Uuid>,
    pub status: AssignmentStatus,
}

impl OrganizationAssignment {
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}

/// The authenticated actor attempting an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account id of the actor.
    pub id: Uuid,
    /// Resolved role from the live account record.
    pub role: RoleType,
    /// All organization assignments on record, including inactive ones.
    /// Scope resolution only ever matches active assignments.
    pub assignments: Vec<OrganizationAssignment>,
}

impl Principal {
    /// Iterate over the assignments that may participate in scope matching.
    pub fn active_assignments(&self) -> impl Iterator<Item = &OrganizationAssignment> {
        self.assignments.iter().filter(|a| a.is_active())
    }
}
