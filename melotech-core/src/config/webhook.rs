/// Inbound webhook verification settings.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    /// HMAC-SHA256 secret. `None` disables verification.
    pub secret: Option<String>,
}

impl WebhookConfig {
    pub fn secret_bytes(&self) -> Option<&[u8]> {
        self.secret.as_deref().map(str::as_bytes)
    }
}
