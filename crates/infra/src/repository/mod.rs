//! Storage ports and their adapters.
//!
//! Repositories return `RepositoryError` for storage faults; "no such
//! record" on reads is `Ok(None)`, not an error.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use stockwatch_auth::{AdminAccount, ProfileChange, SuperAdminGuard};
use stockwatch_core::{AdminId, StockItemId};
use stockwatch_inventory::StockItem;

pub use memory::{InMemoryAdminRepository, InMemoryStockRepository};
pub use postgres::PgStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing store could not be reached or returned garbage.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint was hit.
    #[error("{0}")]
    Conflict(String),

    #[error("record not found")]
    NotFound,

    /// A guarded write would have left no active super admin.
    #[error("At least one super admin is required")]
    LastSuperAdmin,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict("Admin already exists".to_string())
            }
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }
}

/// One addressee of the low-stock alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

impl Recipient {
    /// Name used in the greeting, or the generic fallback.
    pub fn greeting_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { "there" } else { name }
    }
}

impl From<&AdminAccount> for Recipient {
    fn from(account: &AdminAccount) -> Self {
        Self {
            email: account.email.clone(),
            name: account.name.clone(),
        }
    }
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Store a new account. Fails with `Conflict` if the email is taken.
    async fn insert(&self, account: AdminAccount) -> Result<AdminAccount, RepositoryError>;

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError>;

    /// Look up an active account by its normalized email.
    async fn find_active_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AdminAccount>, RepositoryError>;

    async fn list_active(&self) -> Result<Vec<AdminAccount>, RepositoryError>;

    /// Active accounts that opted in to notifications.
    async fn list_notification_recipients(&self) -> Result<Vec<Recipient>, RepositoryError>;

    async fn count_active_supers(&self) -> Result<usize, RepositoryError>;

    /// Apply `change` to `target_id` as one unit.
    ///
    /// When `guard` is set, active super admins are counted under the same
    /// lock or transaction as the write; if the guard rejects the count,
    /// nothing is written and `LastSuperAdmin` is returned.
    async fn apply_profile_change(
        &self,
        target_id: AdminId,
        change: &ProfileChange,
        guard: Option<SuperAdminGuard>,
    ) -> Result<AdminAccount, RepositoryError>;
}

#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn insert(&self, item: StockItem) -> Result<StockItem, RepositoryError>;

    async fn find_by_id(&self, id: StockItemId) -> Result<Option<StockItem>, RepositoryError>;

    /// Overwrite an existing item. Fails with `NotFound` if it was never stored.
    async fn update(&self, item: &StockItem) -> Result<(), RepositoryError>;

    async fn list_active(&self) -> Result<Vec<StockItem>, RepositoryError>;

    /// Active items below the low-stock threshold.
    async fn list_low_stock(&self) -> Result<Vec<StockItem>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_falls_back_for_blank_names() {
        let r = Recipient {
            email: "a@example.com".to_string(),
            name: "   ".to_string(),
        };
        assert_eq!(r.greeting_name(), "there");

        let r = Recipient {
            email: "a@example.com".to_string(),
            name: "Sam".to_string(),
        };
        assert_eq!(r.greeting_name(), "Sam");
    }
}
