//! Notification delivery via SMTP.
//!
//! [`EmailNotifier`] resolves the recipients of a [`Notification`] as
//! the active actors holding its capability, then sends each one a
//! plain-text email through the `lettre` async SMTP transport.
//! Configuration is loaded from environment variables; if `SMTP_HOST`
//! is not set, [`EmailConfig::from_env`] returns `None` and callers
//! should fall back to [`NoopNotifier`].

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sqlx::PgPool;
use tracing::{debug, info};

use cellworks_core::notify::{Notification, Notifier, NotifyError};
use cellworks_db::repositories::ActorRepo;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@cellworks.local";

/// Configuration for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured.
    ///
    /// | Variable        | Required | Default                    |
    /// |-----------------|----------|----------------------------|
    /// | `SMTP_HOST`     | yes      | —                          |
    /// | `SMTP_PORT`     | no       | `587`                      |
    /// | `SMTP_FROM`     | no       | `noreply@cellworks.local`  |
    /// | `SMTP_USER`     | no       | —                          |
    /// | `SMTP_PASSWORD` | no       | —                          |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// SMTP-backed [`Notifier`], resolving recipients from the actor tables.
pub struct EmailNotifier {
    pool: PgPool,
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(pool: PgPool, config: EmailConfig) -> Self {
        Self { pool, config }
    }

    async fn send_to(&self, to_email: &str, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|e: lettre::address::AddressError| NotifyError(e.to_string()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| NotifyError(e.to_string()))?)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| NotifyError(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| NotifyError(e.to_string()))?
                .port(self.config.smtp_port);
        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer
            .send(email)
            .await
            .map_err(|e| NotifyError(e.to_string()))?;
        info!(to = to_email, subject = %notification.subject, "Notification email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let recipients =
            ActorRepo::emails_with_capability(&self.pool, &notification.recipient_capability)
                .await
                .map_err(|e| NotifyError(e.to_string()))?;
        if recipients.is_empty() {
            debug!(
                capability = %notification.recipient_capability,
                "No recipients hold the capability, nothing to send"
            );
            return Ok(());
        }

        let mut failures = 0usize;
        for recipient in &recipients {
            if self.send_to(recipient, notification).await.is_err() {
                failures += 1;
            }
        }
        if failures > 0 {
            return Err(NotifyError(format!(
                "{failures} of {} deliveries failed",
                recipients.len()
            )));
        }
        Ok(())
    }
}

/// Notifier used when SMTP is not configured: logs and discards.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        debug!(
            subject = %notification.subject,
            capability = %notification.recipient_capability,
            "Email delivery not configured, notification discarded"
        );
        Ok(())
    }
}
