//! Shared data model for the Carelock authorization and lifecycle engine.
//!
//! This crate holds the plain data types exchanged between request handlers
//! and the engine in `carelock-core`: principals and their organization
//! assignments, resource descriptors, lifecycle states, compliance holds,
//! and audit log entries.
//!
//! Everything here is serde-serializable and carries no behaviour beyond
//! validation and small derived predicates (for example, whether a resource
//! type supports soft deletion). Policy decisions, the lifecycle state
//! machine, and audit recording all live in `carelock-core`.

mod audit;
mod hold;
mod principal;
mod resource;

pub use audit::{ActionType, AuditLogEntry};
pub use hold::{ComplianceHold, HoldStatus};
pub use principal::{AssignmentStatus, OrganizationAssignment, Principal, RoleType};
pub use resource::{LifecycleState, RecordStatus, ResourceRef, ResourceType, StatusError};
