//! Request/response bodies. Field names follow the existing JSON clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwatch_auth::{AdminAccount, AdminRole};
use stockwatch_core::{AdminId, RecordStatus};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: AdminId,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub token: String,
}

impl SessionResponse {
    pub fn new(account: &AdminAccount, token: String) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub email: String,
    pub notification: bool,
    pub role: AdminRole,
}

impl From<&AdminAccount> for ProfileResponse {
    fn from(account: &AdminAccount) -> Self {
        Self {
            name: account.name.clone(),
            email: account.email.clone(),
            notification: account.notification,
            role: account.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub id: AdminId,
    pub name: String,
    pub email: String,
    pub status: RecordStatus,
    pub notification: bool,
    pub role: AdminRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ProfileUpdateResponse {
    pub fn new(account: &AdminAccount, token: Option<String>) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            status: account.status,
            notification: account.notification,
            role: account.role,
            token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStockRequest {
    pub title: String,
    pub quantity: i64,
    #[serde(default)]
    pub status: Option<RecordStatus>,
    #[serde(default, rename = "createDate")]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "updateDate")]
    pub update_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStockRequest {
    pub title: Option<String>,
    pub quantity: Option<i64>,
    pub status: Option<RecordStatus>,
    #[serde(rename = "createDate")]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(rename = "updateDate")]
    pub update_date: Option<DateTime<Utc>>,
}
