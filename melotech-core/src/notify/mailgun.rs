//! Mailgun HTTP transport.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{EmailMessage, MailError, MailTransport};
use crate::config::MailgunConfig;

/// Sends email through the Mailgun messages API.
///
/// The configuration is read on every send so a reload takes effect for the
/// next message.
#[derive(Clone)]
pub struct MailgunTransport {
    config: Arc<RwLock<MailgunConfig>>,
    http_client: reqwest::Client,
}

impl MailgunTransport {
    pub fn new(config: Arc<RwLock<MailgunConfig>>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl MailTransport for MailgunTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let (url, api_key, from) = {
            let config = self.config.read().await;
            if config.api_key.is_empty() || config.domain.is_empty() {
                return Err(MailError::NotConfigured);
            }
            (
                config.messages_url()?,
                config.api_key.clone(),
                config.from_email.clone(),
            )
        };

        let form = [
            ("from", from.as_str()),
            ("to", message.to.as_str()),
            ("subject", message.subject.as_str()),
            ("text", message.text.as_str()),
            ("html", message.html.as_str()),
        ];

        let response = self
            .http_client
            .post(url)
            .basic_auth("api", Some(api_key))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %message.to, "Mailgun accepted message");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MailError::DeliveryFailed {
                status: status.as_u16(),
                body,
            })
        }
    }
}
