//! Resource descriptors, lifecycle states and business status.
//!
//! A [`ResourceRef`] is a lightweight descriptor of a stored record,
//! fetched from storage immediately before a decision. It is always
//! re-fetched per request and never cached across requests, so a decision
//! can only ever be made against the current persisted state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of record types governed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Appointment,
    PatientRecord,
    LabResult,
    InsuranceClaim,
    MedicalImage,
    Encounter,
    TelemedicineSession,
    VitalsRecord,
    DashboardPreference,
    MfaFactor,
    Reminder,
    Amendment,
    BillingInvoice,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Appointment => "appointment",
            ResourceType::PatientRecord => "patient_record",
            ResourceType::LabResult => "lab_result",
            ResourceType::InsuranceClaim => "insurance_claim",
            ResourceType::MedicalImage => "medical_image",
            ResourceType::Encounter => "encounter",
            ResourceType::TelemedicineSession => "telemedicine_session",
            ResourceType::VitalsRecord => "vitals_record",
            ResourceType::DashboardPreference => "dashboard_preference",
            ResourceType::MfaFactor => "mfa_factor",
            ResourceType::Reminder => "reminder",
            ResourceType::Amendment => "amendment",
            ResourceType::BillingInvoice => "billing_invoice",
        }
    }

    /// Whether this is a clinical record type, as opposed to a user-owned
    /// one (dashboard preferences, MFA factors, reminders, amendments) or
    /// an administrative one.
    ///
    /// Clinical staff scope narrows to assigned-provider/participant for
    /// these types only; user-owned types are governed by the ownership
    /// and self-only predicates instead.
    pub fn is_clinical(&self) -> bool {
        matches!(
            self,
            ResourceType::Appointment
                | ResourceType::Encounter
                | ResourceType::TelemedicineSession
                | ResourceType::VitalsRecord
                | ResourceType::LabResult
                | ResourceType::PatientRecord
                | ResourceType::MedicalImage
        )
    }

    /// Whether records of this type can be soft-deleted (and restored).
    ///
    /// MFA factors and medical images are removed outright when deleted;
    /// there is no recoverable intermediate state for them.
    pub fn supports_soft_delete(&self) -> bool {
        !matches!(self, ResourceType::MfaFactor | ResourceType::MedicalImage)
    }

    /// Whether records of this type can be physically removed.
    ///
    /// Appointments, dashboard preferences and reminders only ever move to
    /// the soft-deleted state; their rows are retained.
    pub fn supports_hard_delete(&self) -> bool {
        !matches!(
            self,
            ResourceType::Appointment | ResourceType::DashboardPreference | ResourceType::Reminder
        )
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of a stored record, as needed for an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub resource_id: Uuid,
    /// Organization the record belongs to.
    pub organization_id: Uuid,
    /// Department the record belongs to, where the type is departmental.
    pub department_id: Option<Uuid>,
    /// Owning user for user-owned records (dashboard preferences, authored
    /// amendments, a patient's own clinical data).
    pub owner_id: Option<Uuid>,
    /// Assigned clinician for clinical records.
    pub assigned_provider_id: Option<Uuid>,
}

/// Position of a record in its lifecycle state machine.
///
/// Transitions are monotonic: `Active` → `SoftDeleted` → `HardDeleted`, or
/// `Active` → `HardDeleted` directly. The only backward move is an explicit
/// `Restore` from `SoftDeleted` to `Active`, which is role-gated and audited
/// as its own action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    Active,
    SoftDeleted { deleted_at: DateTime<Utc> },
    /// Terminal. The row is physically absent; stores may surface this via
    /// a tombstone, but most simply return no snapshot at all.
    HardDeleted,
}

impl LifecycleState {
    pub fn is_deleted(&self) -> bool {
        !matches!(self, LifecycleState::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::HardDeleted)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Active => f.write_str("active"),
            LifecycleState::SoftDeleted { .. } => f.write_str("soft_deleted"),
            LifecycleState::HardDeleted => f.write_str("hard_deleted"),
        }
    }
}

/// Errors that can occur when constructing a [`RecordStatus`].
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// The input status was empty or contained only whitespace
    #[error("record status cannot be empty")]
    Empty,
}

/// Statuses that lock a record against deletion independently of its
/// lifecycle state.
const FINALIZED_STATUSES: &[&str] = &["completed", "finalized", "locked"];

/// A record's business status (for example `"draft"`, `"completed"`).
///
/// This wraps the free-form status column carried by most record types and
/// guarantees non-empty, trimmed content once constructed. Certain statuses
/// act as a business lock: a finalized record cannot be deleted even by a
/// role that is otherwise fully in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStatus(String);

impl RecordStatus {
    /// Creates a new `RecordStatus` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace and
    /// lowercased for comparison stability. Returns `StatusError::Empty`
    /// if nothing remains after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, StatusError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(StatusError::Empty);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this status is a business lock against deletion.
    pub fn is_finalized(&self) -> bool {
        FINALIZED_STATUSES.contains(&self.0.as_str())
    }

    /// Whether this status marks a not-yet-committed record. Draft sibling
    /// records never block deletion of the records they reference.
    pub fn is_draft(&self) -> bool {
        self.0 == "draft"
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordStatus {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for RecordStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for RecordStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordStatus::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mfa_factors_are_hard_delete_only() {
        assert!(!ResourceType::MfaFactor.supports_soft_delete());
        assert!(ResourceType::MfaFactor.supports_hard_delete());
    }

    #[test]
    fn appointments_are_soft_delete_only() {
        assert!(ResourceType::Appointment.supports_soft_delete());
        assert!(!ResourceType::Appointment.supports_hard_delete());
    }

    #[test]
    fn user_owned_types_are_not_clinical() {
        assert!(ResourceType::LabResult.is_clinical());
        assert!(ResourceType::PatientRecord.is_clinical());
        assert!(!ResourceType::DashboardPreference.is_clinical());
        assert!(!ResourceType::MfaFactor.is_clinical());
        assert!(!ResourceType::Reminder.is_clinical());
    }

    #[test]
    fn lifecycle_state_serialises_tagged() {
        let s = serde_json::to_string(&LifecycleState::Active).unwrap();
        assert_eq!(s, "{\"state\":\"active\"}");
    }

    #[test]
    fn status_is_trimmed_and_lowercased() {
        let status = RecordStatus::new("  Completed ").unwrap();
        assert_eq!(status.as_str(), "completed");
        assert!(status.is_finalized());
    }

    #[test]
    fn empty_status_is_rejected() {
        assert!(RecordStatus::new("   ").is_err());
    }

    #[test]
    fn draft_status_is_not_finalized() {
        let status = RecordStatus::new("draft").unwrap();
        assert!(status.is_draft());
        assert!(!status.is_finalized());
    }
}
