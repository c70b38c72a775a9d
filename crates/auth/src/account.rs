//! Admin account entity.

use serde::{Deserialize, Serialize};

use stockwatch_core::{AdminId, DomainError, Entity, RecordStatus};

use crate::{AdminRole, PasswordHash};

/// An admin account as stored.
///
/// # Invariants
/// - `email` is unique, trimmed and lower-cased.
/// - `password_hash` is an encoded hash; plaintext never reaches this type.
/// - Deleted accounts cannot log in and receive no notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub id: AdminId,
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub status: RecordStatus,
    pub role: AdminRole,
    pub notification: bool,
}

impl AdminAccount {
    /// Build a freshly registered account.
    pub fn register(
        id: AdminId,
        registration: &NewAdmin,
        password_hash: PasswordHash,
        role: AdminRole,
    ) -> Result<Self, DomainError> {
        registration.validate()?;

        Ok(Self {
            id,
            name: registration.name.trim().to_string(),
            email: normalize_email(&registration.email)?,
            password_hash,
            status: RecordStatus::Active,
            role,
            notification: false,
        })
    }

    /// Active super admins are the ones counted by the last-super guard.
    pub fn is_active_super(&self) -> bool {
        self.status.is_active() && self.role.is_super()
    }

    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            status: self.status,
            notification: self.notification,
            role: self.role,
        }
    }
}

impl Entity for AdminAccount {
    type Id = AdminId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }
}

/// Public view of an account (no credential material).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: AdminId,
    pub name: String,
    pub email: String,
    pub status: RecordStatus,
    pub notification: bool,
    pub role: AdminRole,
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewAdmin {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        normalize_email(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        Ok(())
    }
}

/// Trim and lower-case an email address, rejecting obviously malformed ones.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email)
}
