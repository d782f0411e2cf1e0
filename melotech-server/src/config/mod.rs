//! Configuration module for melotech-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::FileConfig;
use melotech_core::config::{MailgunConfig, ServerConfig, SharedConfig, WebhookConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing or incomplete configuration: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub mailgun: MailgunConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.webhook, self.mailgun)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides and validate.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let missing = file_config.missing_keys();
    if !missing.is_empty() {
        return Err(ConfigError::MissingKeys(missing));
    }
    if file_config.server.send_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "server.send_timeout_secs must be greater than zero".into(),
        ));
    }
    let api_base = Url::parse(&file_config.mailgun.api_base).map_err(|e| {
        ConfigError::ValidationError(format!("mailgun.api_base is not a valid URL: {e}"))
    })?;

    let webhook = WebhookConfig {
        secret: file_config.webhook_secret(),
    };
    if webhook.secret.is_none() {
        tracing::warn!("No webhook secret configured, signatures will not be verified");
    }

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
            send_timeout: Duration::from_secs(file_config.server.send_timeout_secs),
        },
        webhook,
        mailgun: MailgunConfig {
            api_key: file_config.mailgun.api_key,
            domain: file_config.mailgun.domain,
            from_email: file_config.mailgun.from_email,
            api_base,
        },
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "melotech-{name}-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    const VALID: &str = r#"
[webhook]
secret = "whsec"

[mailgun]
api_key = "key-abc"
domain = "mg.example.com"
from_email = "noreply@example.com"
"#;

    #[test]
    fn test_load_with_listen_override() {
        let path = write_config("valid", VALID);
        let loader = ConfigLoader::new(&path, Some("127.0.0.1:9000".parse().unwrap()));
        let loaded = loader.load().unwrap();
        assert_eq!(loaded.server.listen.port(), 9000);
        assert_eq!(loaded.server.send_timeout, Duration::from_secs(10));
        assert_eq!(loaded.webhook.secret.as_deref(), Some("whsec"));
        assert_eq!(
            loaded.mailgun.messages_url().unwrap().as_str(),
            "https://api.mailgun.net/v3/mg.example.com/messages"
        );
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_keys_are_listed() {
        let path = write_config("missing", "[mailgun]\napi_key = \"your_key\"\n");
        let err = ConfigLoader::new(&path, None).load().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing or incomplete configuration: mailgun.api_key, mailgun.domain"
        );
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new("/nonexistent/melotech.toml", None)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
