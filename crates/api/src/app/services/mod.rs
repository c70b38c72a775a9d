//! Application services: the use cases behind each route, wired to
//! repositories and credential helpers.

mod accounts;
mod stock;

use std::sync::Arc;

use thiserror::Error;

use stockwatch_auth::{CredentialError, Hs256Tokens, ProfilePolicyError};
use stockwatch_core::DomainError;
use stockwatch_infra::{
    AdminRepository, InMemoryAdminRepository, InMemoryStockRepository, LogOnlySender,
    LowStockNotifier, ManualTrigger, RepositoryError, StockRepository,
};

pub use accounts::{AccountService, ProfileUpdated, Session};
pub use stock::{StockService, update_command};

/// Failure of a use case, mapped to an HTTP response by `errors`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Policy(#[from] ProfilePolicyError),

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Admin already exists")]
    AdminExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Stock item not found")]
    StockNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Everything the HTTP layer needs.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: AccountService,
    pub stock: StockService,
    pub notify: ManualTrigger,
    pub tokens: Arc<Hs256Tokens>,
    pub admins: Arc<dyn AdminRepository>,
}

impl AppServices {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        stock: Arc<dyn StockRepository>,
        tokens: Arc<Hs256Tokens>,
        notify: ManualTrigger,
    ) -> Self {
        Self {
            accounts: AccountService::new(admins.clone(), tokens.clone()),
            stock: StockService::new(stock),
            notify,
            tokens,
            admins,
        }
    }

    /// In-memory wiring with a log-only sender, for dev and tests.
    pub fn in_memory(jwt_secret: &str) -> Self {
        let admins: Arc<dyn AdminRepository> = Arc::new(InMemoryAdminRepository::new());
        let stock: Arc<dyn StockRepository> = Arc::new(InMemoryStockRepository::new());
        Self::with_repositories(admins, stock, jwt_secret)
    }

    /// Wire services over the given repositories with a log-only sender.
    pub fn with_repositories(
        admins: Arc<dyn AdminRepository>,
        stock: Arc<dyn StockRepository>,
        jwt_secret: &str,
    ) -> Self {
        let notifier = LowStockNotifier::new(stock.clone(), admins.clone(), Arc::new(LogOnlySender));
        Self::new(
            admins,
            stock,
            Arc::new(Hs256Tokens::new(jwt_secret.as_bytes())),
            ManualTrigger::new(notifier),
        )
    }
}
