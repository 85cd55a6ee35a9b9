//! # Carelock Core
//!
//! The authorization-and-record-lifecycle guard for the Carelock platform.
//!
//! Request handlers across the administration backend all answer the same
//! question — may this principal perform this action on this record, and
//! what does that do to the record's lifecycle state? This crate answers it
//! once, as a library:
//!
//! - [`principal`] resolves a verified token subject into a live
//!   [`Principal`](carelock_types::Principal), re-checking account state on
//!   every request.
//! - [`scope`] decides whether a resource falls inside the principal's
//!   organizational boundary, from assignment records only.
//! - [`policy`] combines the role capability table with scope and resource
//!   predicates into an allow/deny decision with an audit-grade reason.
//! - [`lifecycle`] enforces the Active → SoftDeleted → HardDeleted state
//!   machine under compliance holds and business locks, producing pure
//!   mutation plans.
//! - [`audit`] turns every state-changing decision (and denied destructive
//!   attempt) into a structured, append-only log entry.
//! - [`engine`] wires the pieces together behind
//!   [`PolicyEngine::execute`](engine::PolicyEngine::execute).
//!
//! **No transport concerns**: HTTP, JWT verification, pagination and
//! persistence live with the caller. Storage, clock and id generation are
//! injected via the traits in [`store`].

pub mod audit;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod principal;
pub mod scope;
pub mod store;

pub use carelock_types as types;

pub use audit::{AuditEvent, AuditOutcome, AuditRecorder};
pub use engine::{ActionRequest, EngineOutcome, PolicyEngine};
pub use error::{GuardError, GuardResult};
pub use lifecycle::{
    plan_transition, SiblingBlockers, StateMutation, TransitionKind, TransitionOutcome,
    TransitionPlan,
};
pub use policy::{capability, evaluate, Capability, Decision, DenyReason, PolicyDecision};
pub use principal::{resolve_principal, AccountDirectory, AccountRecord, AccountStatus};
pub use scope::{resolve_scope, ScopeDecision};
pub use store::{
    Clock, CommitOutcome, IdGenerator, RecordStore, ResourceSnapshot, SystemClock, UuidGenerator,
};
