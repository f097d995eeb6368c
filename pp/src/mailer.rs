//! Email delivery collaborator
//!
//! A single `send` capability behind a trait, implemented over SMTP with
//! lettre. Delivery is optional: an unconfigured deployment gets a typed
//! not-configured error instead of a transport attempt, and the executor
//! reports that inside `email_status` rather than failing the request.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::EmailConfig;

/// Errors from email dispatch
#[derive(Debug, Error)]
pub enum MailError {
    #[error("email delivery is not configured")]
    NotConfigured,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("smtp transport failed: {0}")]
    Transport(String),
}

/// Email delivery capability
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one HTML email; a single attempt, reported verbatim
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// SMTP mailer built on lettre
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from configuration
    ///
    /// Fails with `NotConfigured` when the SMTP host or sender address is
    /// missing. Credentials are read from the environment variables named
    /// in config; without them the relay is used unauthenticated.
    pub fn from_config(config: &EmailConfig) -> Result<Self, MailError> {
        if !config.is_configured() {
            return Err(MailError::NotConfigured);
        }

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from.clone()))?;

        let mut builder = SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.smtp_port);

        if let (Ok(username), Ok(password)) = (
            std::env::var(&config.username_env),
            std::env::var(&config.password_env),
        ) {
            debug!("from_config: using SMTP credentials from environment");
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|_| MailError::InvalidAddress(to.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| MailError::Message(e.to_string()))?;

        // lettre's SmtpTransport is blocking; keep it off the async runtime
        let transport = self.transport.clone();
        let result = tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        result.map_err(|e| MailError::Transport(e.to_string()))?;
        info!(%to, "email dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_config_rejected() {
        let config = EmailConfig::default();
        let result = SmtpMailer::from_config(&config);
        assert!(matches!(result, Err(MailError::NotConfigured)));
    }

    #[test]
    fn test_bad_sender_address_rejected() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            from: "not an address".to_string(),
            ..EmailConfig::default()
        };

        let result = SmtpMailer::from_config(&config);
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }

    #[test]
    fn test_configured_mailer_builds() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            from: "Planner <planner@example.com>".to_string(),
            ..EmailConfig::default()
        };

        let mailer = SmtpMailer::from_config(&config);
        assert!(mailer.is_ok());
    }
}
