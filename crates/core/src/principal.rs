//! Principal resolution.
//!
//! Tokens are verified by an external auth collaborator before they reach
//! the engine, but a verified token only proves who the caller *was* at
//! issuance. The resolver re-checks the live account record on every
//! request, so an account deactivated after login loses access immediately
//! rather than at token expiry.

use carelock_types::{OrganizationAssignment, Principal, RoleType};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{GuardError, GuardResult};

/// Live state of the account backing a token subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Deactivated,
    Revoked,
}

/// The account row behind an authenticated identity, as stored.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: Uuid,
    pub role: RoleType,
    pub status: AccountStatus,
    /// Set when the account itself has been soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    pub assignments: Vec<OrganizationAssignment>,
}

/// External identity collaborator: looks up the live account row for a
/// verified token subject.
pub trait AccountDirectory: Send + Sync {
    /// Fetch the account record for `subject`, or `None` if no such account
    /// exists (deleted accounts may be absent entirely).
    ///
    /// # Errors
    /// Returns `GuardError::TransientFailure` on storage timeout.
    fn lookup(&self, subject: Uuid) -> GuardResult<Option<AccountRecord>>;
}

/// Resolve a verified token subject into a [`Principal`].
///
/// The returned principal is immutable for the request's lifetime and is
/// never persisted beyond the session.
///
/// # Errors
/// Returns `GuardError::PrincipalInactive` if the account is missing,
/// deactivated, revoked, or soft-deleted since token issuance.
pub fn resolve_principal(
    directory: &dyn AccountDirectory,
    subject: Uuid,
) -> GuardResult<Principal> {
    let account = directory
        .lookup(subject)?
        .ok_or(GuardError::PrincipalInactive)?;

    if account.deleted_at.is_some() || account.status != AccountStatus::Active {
        tracing::warn!(subject = %subject, "rejected token for inactive account");
        return Err(GuardError::PrincipalInactive);
    }

    Ok(Principal {
        id: account.id,
        role: account.role,
        assignments: account.assignments,
    })
}
