//! Actions and audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ResourceType;

/// The closed set of actions a principal can request against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Read,
    Create,
    Update,
    SoftDelete,
    HardDelete,
    Restore,
    Export,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Read => "read",
            ActionType::Create => "create",
            ActionType::Update => "update",
            ActionType::SoftDelete => "soft_delete",
            ActionType::HardDelete => "hard_delete",
            ActionType::Restore => "restore",
            ActionType::Export => "export",
        }
    }

    /// Whether this action removes a record (softly or otherwise).
    pub fn is_destructive(&self) -> bool {
        matches!(self, ActionType::SoftDelete | ActionType::HardDelete)
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry in the append-only audit log.
///
/// An entry is written for every allowed decision that changes lifecycle
/// state, and for every denied delete or export attempt. Entries are
/// write-only within a request: the engine never reads the log back while
/// deciding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub organization_id: Uuid,
    pub action: ActionType,
    pub entity_type: ResourceType,
    pub entity_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Structured decision context: outcome, matched rule, deny reason,
    /// prior and new lifecycle states.
    pub context: serde_json::Value,
}
