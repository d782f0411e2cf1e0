//! Application state shared across all request handlers.

use melotech_core::broadcaster::EventBroadcaster;
use melotech_core::config::SharedConfig;
use melotech_core::notify::{MailTransport, NotificationDispatcher, UserDirectory};
use melotech_core::registry::ConnectionRegistry;
use melotech_core::webhook::WebhookHandler;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Configuration sections (reloadable ones are swapped on SIGHUP).
    pub config: SharedConfig,
    /// Live WebSocket connections grouped by room.
    pub registry: Arc<ConnectionRegistry>,
    /// Entry point of both webhook endpoints.
    pub webhooks: Arc<WebhookHandler>,
}

impl AppState {
    /// Wire the registry, dispatcher and webhook handler together.
    pub fn new(
        config: SharedConfig,
        directory: Arc<dyn UserDirectory>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::with_default_templates(directory, transport);
        let broadcaster = EventBroadcaster::new(Arc::clone(&registry));
        let webhooks = Arc::new(WebhookHandler::new(
            Arc::clone(&config.webhook),
            dispatcher,
            broadcaster,
        ));
        Self {
            config,
            registry,
            webhooks,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use melotech_core::config::{MailgunConfig, ServerConfig, WebhookConfig};
    use melotech_core::notify::{DirectoryError, EmailMessage, MailError};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Knows a single user, `u1`.
    pub struct OneUser;

    #[async_trait]
    impl UserDirectory for OneUser {
        async fn email_for(&self, key: &str) -> Result<Option<String>, DirectoryError> {
            Ok((key == "u1").then(|| "artist@example.com".to_string()))
        }
    }

    /// Collects every message instead of sending it.
    #[derive(Default)]
    pub struct Outbox(pub Mutex<Vec<EmailMessage>>);

    #[async_trait]
    impl MailTransport for Outbox {
        async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
            self.0.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    pub fn test_state(secret: Option<&str>) -> (AppState, Arc<Outbox>) {
        let config = SharedConfig::new(
            ServerConfig {
                listen: "127.0.0.1:0".parse().unwrap(),
                send_timeout: Duration::from_secs(1),
            },
            WebhookConfig {
                secret: secret.map(Into::into),
            },
            MailgunConfig {
                api_key: "key".into(),
                domain: "mg.example.com".into(),
                from_email: "noreply@example.com".into(),
                api_base: "https://api.mailgun.net/v3".parse().unwrap(),
            },
        );
        let outbox = Arc::new(Outbox::default());
        (AppState::new(config, Arc::new(OneUser), outbox.clone()), outbox)
    }
}
