//! Runtime configuration shared between the core and the server.
//!
//! The server crate parses and validates the file; these are the validated
//! values. Sections that can be reloaded sit behind their own lock.

mod mailgun;
mod server;
mod webhook;

pub use mailgun::MailgunConfig;
pub use server::ServerConfig;
pub use webhook::WebhookConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
#[derive(Clone)]
pub struct SharedConfig {
    /// Listen address and send timeout. Not reloadable.
    pub server: Arc<RwLock<ServerConfig>>,
    /// Signing secret for inbound webhooks.
    pub webhook: Arc<RwLock<WebhookConfig>>,
    /// Mail provider credentials.
    pub mailgun: Arc<RwLock<MailgunConfig>>,
}

impl SharedConfig {
    pub fn new(server: ServerConfig, webhook: WebhookConfig, mailgun: MailgunConfig) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            webhook: Arc::new(RwLock::new(webhook)),
            mailgun: Arc::new(RwLock::new(mailgun)),
        }
    }
}
