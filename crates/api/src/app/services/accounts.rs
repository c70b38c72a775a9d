use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use stockwatch_auth::{
    Actor, AdminAccount, AdminProfile, AdminRole, NewAdmin, PasswordHash, ProfilePolicyError,
    ProfileUpdate, TokenIssuer, hash_password, normalize_email, plan_profile_update,
    resolve_target, verify_password,
};
use stockwatch_core::AdminId;
use stockwatch_infra::{AdminRepository, RepositoryError};

use super::ServiceError;

/// An authenticated account plus a fresh session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: AdminAccount,
    pub token: String,
}

/// Result of a profile update. `token` is set only when the actor updated themselves.
#[derive(Debug, Clone)]
pub struct ProfileUpdated {
    pub account: AdminAccount,
    pub token: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    admins: Arc<dyn AdminRepository>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AccountService {
    pub fn new(admins: Arc<dyn AdminRepository>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { admins, tokens }
    }

    /// Create an account. While no active super admin exists, the new account
    /// becomes one; afterwards registrations are plain admins.
    pub async fn register(&self, registration: NewAdmin) -> Result<Session, ServiceError> {
        registration.validate()?;
        let email = normalize_email(&registration.email)?;

        // Also enforced by the repository; checked first for the common case.
        if self.admins.find_active_by_email(&email).await?.is_some() {
            return Err(ServiceError::AdminExists);
        }

        let role = if self.admins.count_active_supers().await? == 0 {
            AdminRole::Super
        } else {
            AdminRole::Admin
        };

        let password_hash = hash_blocking(registration.password.clone()).await?;
        let account = AdminAccount::register(AdminId::new(), &registration, password_hash, role)?;

        let account = self.admins.insert(account).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => ServiceError::AdminExists,
            other => ServiceError::Repository(other),
        })?;

        info!(admin_id = %account.id, role = %account.role, "admin registered");
        let token = self.tokens.issue(account.id, Utc::now())?;
        Ok(Session { account, token })
    }

    /// Check credentials of an active account.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let Ok(email) = normalize_email(email) else {
            return Err(ServiceError::InvalidCredentials);
        };
        let Some(account) = self.admins.find_active_by_email(&email).await? else {
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_blocking(password.to_string(), account.password_hash.clone()).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(account.id, Utc::now())?;
        Ok(Session { account, token })
    }

    pub async fn profile(&self, id: AdminId) -> Result<AdminAccount, ServiceError> {
        self.admins
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::AdminNotFound)
    }

    pub async fn list_active(&self) -> Result<Vec<AdminProfile>, ServiceError> {
        Ok(self
            .admins
            .list_active()
            .await?
            .iter()
            .map(AdminAccount::profile)
            .collect())
    }

    /// Apply a profile update on behalf of `actor`.
    ///
    /// All policy checks run before the write; the last-super-admin check
    /// runs inside the repository's guarded write.
    pub async fn update_profile(
        &self,
        actor: Actor,
        update: ProfileUpdate,
    ) -> Result<ProfileUpdated, ServiceError> {
        let target_id = resolve_target(&actor, update.id)?;
        let target = self.admins.find_by_id(target_id).await?;
        let mut plan = plan_profile_update(&actor, target.as_ref(), update)?;

        if let Some(password) = plan.new_password.take() {
            plan.change.password_hash = Some(hash_blocking(password).await?);
        }

        let account = self
            .admins
            .apply_profile_change(plan.target_id, &plan.change, plan.guard)
            .await
            .map_err(|e| match e {
                RepositoryError::LastSuperAdmin => {
                    ServiceError::Policy(ProfilePolicyError::InvariantViolation)
                }
                RepositoryError::NotFound => ServiceError::Policy(ProfilePolicyError::NotFound),
                other => ServiceError::Repository(other),
            })?;

        info!(
            actor = %actor.id,
            target = %account.id,
            self_update = plan.self_update,
            "admin profile updated"
        );

        let token = if plan.self_update {
            Some(self.tokens.issue(account.id, Utc::now())?)
        } else {
            None
        };
        Ok(ProfileUpdated { account, token })
    }
}

async fn hash_blocking(password: String) -> Result<PasswordHash, ServiceError> {
    Ok(tokio::task::spawn_blocking(move || hash_password(&password)).await??)
}

async fn verify_blocking(password: String, hash: PasswordHash) -> Result<bool, ServiceError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?)
}
