//! Outbound email.

mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;

pub use smtp::SmtpMailer;

use crate::config::{EmailConfig, EmailTransport};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address '{0}'")]
    Address(String),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("email transport is not configured: {0}")]
    Config(String),
}

/// A rendered HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email (log transport)");
        tracing::debug!(body = %email.html);
        Ok(())
    }
}

/// Build the mailer selected by configuration.
pub fn mailer_from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.transport {
        EmailTransport::Log => Ok(Arc::new(LogMailer)),
        EmailTransport::Smtp => Ok(Arc::new(SmtpMailer::new(config)?)),
    }
}
