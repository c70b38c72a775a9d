//! Message delivery.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::OutgoingMessage;

/// Per-recipient delivery failure.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to render message: {0}")]
    Template(#[from] askama::Error),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("delivery failed: {0}")]
    Rejected(String),
}

/// Delivers one message to one address.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, to: &str, message: &OutgoingMessage) -> Result<(), SendError>;
}

/// SMTP connection settings.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Full `From` header; defaults to `"Inventory Bot" <username>`.
    pub from: Option<String>,
}

impl core::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

/// Sends multipart (text + HTML) mail over SMTP.
#[derive(Clone)]
pub struct SmtpSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    /// Build a pooled transport for `settings`.
    ///
    /// # Panics
    ///
    /// Must be called, and the sender dropped, inside a Tokio runtime: the
    /// connection pool spawns tasks on creation and on drop.
    pub fn new(settings: &SmtpSettings) -> Result<Self, SendError> {
        let credentials = Credentials::new(
            settings.username.clone(),
            settings.password.expose_secret().to_string(),
        );

        // 465 is implicit TLS; anything else upgrades with STARTTLS.
        let builder = if settings.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        };
        let mailer = builder
            .port(settings.port)
            .credentials(credentials)
            .build();

        let from_raw = settings
            .from
            .clone()
            .unwrap_or_else(|| format!("\"Inventory Bot\" <{}>", settings.username));
        let from = from_raw
            .parse::<Mailbox>()
            .map_err(|_| SendError::InvalidAddress(from_raw.clone()))?;

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl NotificationSender for SmtpSender {
    async fn send(&self, to: &str, message: &OutgoingMessage) -> Result<(), SendError> {
        let to_mailbox = to
            .parse::<Mailbox>()
            .map_err(|_| SendError::InvalidAddress(to.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(message.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )?;

        self.mailer.send(email).await?;
        tracing::debug!(to = %to, subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Logs messages instead of sending them. Used when SMTP is not configured.
#[derive(Debug, Clone, Default)]
pub struct LogOnlySender;

#[async_trait]
impl NotificationSender for LogOnlySender {
    async fn send(&self, to: &str, message: &OutgoingMessage) -> Result<(), SendError> {
        tracing::info!(
            to = %to,
            subject = %message.subject,
            body = %message.text,
            "SMTP not configured; logging notification instead of sending"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(from: Option<&str>) -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "bot@example.com".to_string(),
            password: SecretString::from("pw".to_string()),
            from: from.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn from_defaults_to_inventory_bot() {
        let sender = SmtpSender::new(&settings(None)).unwrap();
        assert_eq!(sender.from.email.to_string(), "bot@example.com");
        assert_eq!(sender.from.name.as_deref(), Some("Inventory Bot"));
    }

    #[tokio::test]
    async fn bad_from_is_rejected() {
        assert!(matches!(
            SmtpSender::new(&settings(Some("not an address"))),
            Err(SendError::InvalidAddress(_))
        ));
    }

    #[test]
    fn debug_redacts_password() {
        let out = format!("{:?}", settings(None));
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("\"pw\""));
    }

    #[tokio::test]
    async fn log_only_sender_always_succeeds() {
        let msg = OutgoingMessage {
            subject: "s".to_string(),
            text: "t".to_string(),
            html: "h".to_string(),
        };
        assert!(LogOnlySender.send("x@example.com", &msg).await.is_ok());
    }
}
