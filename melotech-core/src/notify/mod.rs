//! Email notifications for submission status changes.
//!
//! The [`NotificationDispatcher`] resolves the recipient through a
//! [`UserDirectory`], renders the message with [`MessageTemplates`] and hands
//! it to a [`MailTransport`]. Failures of either collaborator become a
//! [`DispatchOutcome`], never an error.

mod mailgun;
mod templates;

pub use mailgun::MailgunTransport;
pub use templates::StatusTemplates;

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use kanau::processor::Processor;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::events::NotificationDecision;

/// Errors from a [`UserDirectory`].
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors from a [`MailTransport`].
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("mail delivery failed with status {status}: {body}")]
    DeliveryFailed { status: u16, body: String },

    #[error("mail transport is not configured")]
    NotConfigured,

    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Maps a recipient key (the row's `userid`) to an email address.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn email_for(&self, recipient_key: &str) -> Result<Option<String>, DirectoryError>;
}

/// Delivers one email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Renders the subject and bodies for a status.
pub trait MessageTemplates: Send + Sync {
    fn render(&self, status: &str, title: &str, feedback: &str) -> RenderedEmail;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// A notification request for one processed change.
#[derive(Debug, Clone)]
pub struct StatusNotice {
    pub recipient_key: String,
    pub decision: NotificationDecision,
    pub title: String,
    pub status: String,
    pub feedback: String,
}

/// What happened to a [`StatusNotice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { email: String },
    RecipientNotFound,
    SendFailed { email: String },
    /// The decision was ineligible; no collaborator was called.
    Skipped,
}

/// Sends status emails.
#[derive(Clone)]
pub struct NotificationDispatcher {
    directory: Arc<dyn UserDirectory>,
    transport: Arc<dyn MailTransport>,
    templates: Arc<dyn MessageTemplates>,
}

impl NotificationDispatcher {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        transport: Arc<dyn MailTransport>,
        templates: Arc<dyn MessageTemplates>,
    ) -> Self {
        Self {
            directory,
            transport,
            templates,
        }
    }

    /// Dispatcher with the built-in [`StatusTemplates`].
    pub fn with_default_templates(
        directory: Arc<dyn UserDirectory>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self::new(directory, transport, Arc::new(StatusTemplates))
    }
}

impl Processor<StatusNotice> for NotificationDispatcher {
    type Output = DispatchOutcome;
    type Error = Infallible;

    #[tracing::instrument(skip_all, fields(recipient = %notice.recipient_key, status = %notice.status))]
    async fn process(&self, notice: StatusNotice) -> Result<DispatchOutcome, Infallible> {
        if !notice.decision.eligible {
            debug!(reason = ?notice.decision.reason, "Notification skipped");
            return Ok(DispatchOutcome::Skipped);
        }

        let email = match self.directory.email_for(&notice.recipient_key).await {
            Ok(Some(email)) if !email.is_empty() => email,
            Ok(_) => {
                warn!("No email found for recipient");
                return Ok(DispatchOutcome::RecipientNotFound);
            }
            Err(e) => {
                error!(error = %e, "Recipient lookup failed");
                return Ok(DispatchOutcome::RecipientNotFound);
            }
        };

        let rendered = self
            .templates
            .render(&notice.status, &notice.title, &notice.feedback);
        let message = EmailMessage {
            to: email.clone(),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
        };

        match self.transport.send(&message).await {
            Ok(()) => {
                info!(email = %email, "Status email sent");
                Ok(DispatchOutcome::Sent { email })
            }
            Err(e) => {
                error!(email = %email, error = %e, "Status email failed");
                Ok(DispatchOutcome::SendFailed { email })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory directory; `fail` makes every lookup error.
    #[derive(Default)]
    pub struct FakeDirectory {
        pub emails: HashMap<String, String>,
        pub fail: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeDirectory {
        pub fn with(key: &str, email: &str) -> Self {
            Self {
                emails: HashMap::from([(key.to_owned(), email.to_owned())]),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn email_for(&self, key: &str) -> Result<Option<String>, DirectoryError> {
            self.calls.lock().unwrap().push(key.to_owned());
            if self.fail {
                return Err(DirectoryError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(self.emails.get(key).cloned())
        }
    }

    /// Records sent messages; `fail` makes every send error.
    #[derive(Default)]
    pub struct FakeTransport {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail: bool,
    }

    #[async_trait]
    impl MailTransport for FakeTransport {
        async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::DeliveryFailed {
                    status: 500,
                    body: "boom".into(),
                });
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}
