//! Profile mutation policy.
//!
//! Decides, for a profile update request, which account is targeted, which
//! fields may change, and whether the write must be guarded by the
//! "at least one active super admin" rule. Pure: no IO, no hashing.
//! The guarded write itself happens in the repository, which counts active
//! super admins and applies the change as one unit.

use serde::Deserialize;
use thiserror::Error;

use stockwatch_core::{AdminId, DomainError, RecordStatus};

use crate::{AdminAccount, AdminRole, PasswordHash, normalize_email};

/// The authenticated admin performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: AdminId,
    pub role: AdminRole,
}

impl Actor {
    pub fn new(id: AdminId, role: AdminRole) -> Self {
        Self { id, role }
    }

    pub fn is_super(&self) -> bool {
        self.role.is_super()
    }
}

impl From<&AdminAccount> for Actor {
    fn from(account: &AdminAccount) -> Self {
        Self::new(account.id, account.role)
    }
}

/// Rejections produced by the profile policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfilePolicyError {
    #[error("Forbidden")]
    Forbidden,

    #[error("Target admin not found")]
    NotFound,

    #[error("Cannot delete yourself")]
    InvalidOperation,

    #[error("At least one super admin is required")]
    InvariantViolation,

    #[error(transparent)]
    Validation(#[from] DomainError),
}

/// Partial profile update as submitted by a client. `None` means "not sent".
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    /// Target account; only honoured for super admins.
    pub id: Option<AdminId>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub notification: Option<bool>,
    pub role: Option<AdminRole>,
    pub status: Option<RecordStatus>,
}

impl core::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("notification", &self.notification)
            .field("role", &self.role)
            .field("status", &self.status)
            .finish()
    }
}

/// The accepted field changes for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChange {
    pub email: Option<String>,
    pub password_hash: Option<PasswordHash>,
    pub notification: Option<bool>,
    pub role: Option<AdminRole>,
    pub status: Option<RecordStatus>,
}

impl ProfileChange {
    pub fn apply_to(&self, account: &mut AdminAccount) {
        if let Some(email) = &self.email {
            account.email = email.clone();
        }
        if let Some(hash) = &self.password_hash {
            account.password_hash = hash.clone();
        }
        if let Some(notification) = self.notification {
            account.notification = notification;
        }
        if let Some(role) = self.role {
            account.role = role;
        }
        if let Some(status) = self.status {
            account.status = status;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Condition attached to a write that could remove the last active super admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperAdminGuard {
    pub target_id: AdminId,
}

impl SuperAdminGuard {
    /// `active_supers` is counted before the write, target included.
    pub fn permits(&self, active_supers: usize) -> bool {
        active_supers > 1
    }

    pub fn check(&self, active_supers: usize) -> Result<(), ProfilePolicyError> {
        if self.permits(active_supers) {
            Ok(())
        } else {
            Err(ProfilePolicyError::InvariantViolation)
        }
    }
}

/// Outcome of planning: what to write, and under which guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePlan {
    pub target_id: AdminId,
    pub change: ProfileChange,
    /// Plaintext password to be hashed by the caller into `change.password_hash`.
    pub new_password: Option<String>,
    pub guard: Option<SuperAdminGuard>,
    /// The actor updated their own account; a fresh session token is due.
    pub self_update: bool,
}

/// Pick the account a profile update applies to.
///
/// Super admins may name any account; everyone else may only name themselves.
pub fn resolve_target(
    actor: &Actor,
    requested: Option<AdminId>,
) -> Result<AdminId, ProfilePolicyError> {
    match requested {
        Some(id) if actor.is_super() => Ok(id),
        Some(id) if id != actor.id => Err(ProfilePolicyError::Forbidden),
        _ => Ok(actor.id),
    }
}

/// Decide which requested fields apply to `target`.
///
/// `target` is the account loaded for the id returned by [`resolve_target`];
/// `None` means it does not exist.
pub fn plan_profile_update(
    actor: &Actor,
    target: Option<&AdminAccount>,
    update: ProfileUpdate,
) -> Result<ProfilePlan, ProfilePolicyError> {
    let target = target.ok_or(ProfilePolicyError::NotFound)?;
    let self_update = target.id == actor.id;
    let deleting = update.status == Some(RecordStatus::Deleted);

    if deleting && self_update {
        return Err(ProfilePolicyError::InvalidOperation);
    }

    let demoting = update.role.is_some_and(|role| !role.is_super());
    let guard = ((deleting || demoting) && target.role.is_super()).then_some(SuperAdminGuard {
        target_id: target.id,
    });

    let mut change = ProfileChange {
        notification: update.notification,
        ..ProfileChange::default()
    };

    if self_update {
        change.email = update.email.as_deref().map(normalize_email).transpose()?;
    }

    if actor.is_super() {
        change.role = update.role;
        change.status = update.status;
    }

    let new_password = update.password.filter(|p| !p.is_empty());

    Ok(ProfilePlan {
        target_id: target.id,
        change,
        new_password,
        guard,
        self_update,
    })
}
