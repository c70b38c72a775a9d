use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockwatch_core::DomainError;

/// Admin role.
///
/// `Super` admins may mutate any account; plain admins only their own
/// profile. At least one active `Super` must exist at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    #[default]
    Admin,
    Super,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::Super => "super",
        }
    }

    pub fn is_super(&self) -> bool {
        matches!(self, AdminRole::Super)
    }
}

impl core::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(AdminRole::Admin),
            "super" => Ok(AdminRole::Super),
            other => Err(DomainError::validation(format!(
                "role must be one of: admin, super (got '{other}')"
            ))),
        }
    }
}
