//! `stockwatch-auth`: admin identity, credentials, and the profile policy.
//!
//! This crate is decoupled from HTTP and storage: callers load accounts,
//! ask the policy what may change, and persist the result themselves.

pub mod account;
pub mod claims;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use account::{AdminAccount, AdminProfile, NewAdmin, normalize_email};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use password::{CredentialError, PasswordHash, hash_password, verify_password};
pub use policy::{
    Actor, ProfileChange, ProfilePlan, ProfilePolicyError, ProfileUpdate, SuperAdminGuard,
    plan_profile_update, resolve_target,
};
pub use roles::AdminRole;
pub use token::{Hs256Tokens, JwtValidator, SESSION_LIFETIME_DAYS, TokenIssuer};
