//! Compliance holds.
//!
//! A compliance hold is an explicit legal or regulatory lock imposed on a
//! record. While a hold is active, no delete transition may proceed against
//! its subject, irrespective of the acting principal's role.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ResourceType;

/// Whether a hold is currently in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    Active,
    Released,
}

/// A legal/compliance hold on a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceHold {
    pub subject_type: ResourceType,
    pub subject_id: Uuid,
    pub status: HoldStatus,
    /// Account id of the administrator who imposed the hold.
    pub imposed_by: Uuid,
}

impl ComplianceHold {
    pub fn is_active(&self) -> bool {
        self.status == HoldStatus::Active
    }
}
