//! TOML file configuration structures.
//!
//! These structs directly map to the `melotech-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub mailgun: MailgunConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8000").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Seconds a single WebSocket send may take before the connection is
    /// dropped.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000))
}

fn default_send_timeout_secs() -> u64 {
    10
}

/// Webhook configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared HMAC secret of the data store webhooks.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Mailgun configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailgunConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for MailgunConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            domain: String::new(),
            from_email: default_from_email(),
            api_base: default_api_base(),
        }
    }
}

fn default_from_email() -> String {
    "noreply@yourdomain.com".to_string()
}

fn default_api_base() -> String {
    "https://api.mailgun.net/v3".to_string()
}

/// Whether a value is missing or still the `your_...` placeholder from the
/// sample configuration.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.starts_with("your_")
}

impl FileConfig {
    /// Names of the required keys that are missing or placeholders.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            ("mailgun.api_key", &self.mailgun.api_key),
            ("mailgun.domain", &self.mailgun.domain),
            ("mailgun.from_email", &self.mailgun.from_email),
        ]
        .into_iter()
        .filter(|(_, value)| is_placeholder(value))
        .map(|(key, _)| key)
        .collect()
    }

    /// The webhook secret, if one is really configured.
    pub fn webhook_secret(&self) -> Option<String> {
        self.webhook
            .secret
            .as_deref()
            .filter(|s| !is_placeholder(s))
            .map(str::to_owned)
    }
}
