//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `HOST` - bind address (default: 0.0.0.0)
//! - `PORT` - listen port (default: 5001)
//! - `JWT_SECRET` - session signing secret; required when `APP_ENV=production`
//! - `DATABASE_URL` - `PostgreSQL` connection string; unset means in-memory storage
//! - `CRON_SCHEDULE` - low-stock notification cadence (default: `0 9 * * *`)
//! - `CRON_TIMEZONE` - IANA timezone the cadence is evaluated in (default: Australia/Brisbane)
//! - `SMTP_HOST` / `SMTP_PORT` - mail relay (default: smtp.gmail.com:587)
//! - `SMTP_USER` / `SMTP_PASS` - relay credentials; unset means notifications are only logged
//! - `MAIL_FROM` - sender header (default: `"Inventory Bot" <SMTP_USER>`)

use std::net::{IpAddr, SocketAddr};

use chrono_tz::Tz;
use secrecy::SecretString;
use thiserror::Error;

use stockwatch_infra::{CronSchedule, SmtpSettings};

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_CRON_SCHEDULE: &str = "0 9 * * *";
pub const DEFAULT_TIMEZONE: &str = "Australia/Brisbane";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub database_url: Option<SecretString>,
    pub cron_schedule: CronSchedule,
    pub timezone: Tz,
    pub smtp: Option<SmtpSettings>,
}

impl AppConfig {
    /// Load configuration from the process environment (after `.env`, if any).
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::InvalidEnvVar(".env".to_string(), e.to_string())),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .map_err(|e| invalid("HOST", e))?;
        let port = match get("PORT") {
            Some(p) => p.parse::<u16>().map_err(|e| invalid("PORT", e))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if get("APP_ENV").as_deref() == Some("production") => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()));
            }
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let cron_schedule = get("CRON_SCHEDULE")
            .unwrap_or_else(|| DEFAULT_CRON_SCHEDULE.to_string())
            .parse::<CronSchedule>()
            .map_err(|e| invalid("CRON_SCHEDULE", e))?;
        let timezone = get("CRON_TIMEZONE")
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
            .parse::<Tz>()
            .map_err(|e| invalid("CRON_TIMEZONE", e))?;

        let smtp = match (get("SMTP_USER"), get("SMTP_PASS")) {
            (Some(username), Some(password)) => {
                let port = match get("SMTP_PORT") {
                    Some(p) => p.parse::<u16>().map_err(|e| invalid("SMTP_PORT", e))?,
                    None => 587,
                };
                Some(SmtpSettings {
                    host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                    port,
                    username,
                    password: SecretString::from(password),
                    from: get("MAIL_FROM"),
                })
            }
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "SMTP_USER/SMTP_PASS".to_string(),
                    "both must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            host,
            port,
            jwt_secret: SecretString::from(jwt_secret),
            database_url: get("DATABASE_URL").map(SecretString::from),
            cron_schedule,
            timezone,
            smtp,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn invalid(key: &str, err: impl core::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), err.to_string())
}
