//! Mail provider credentials.

use url::Url;

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    pub from_email: String,
    /// Base of the provider API, e.g. `https://api.mailgun.net/v3/`.
    pub api_base: Url,
}

impl MailgunConfig {
    /// `{api_base}/{domain}/messages`
    pub fn messages_url(&self) -> Result<Url, url::ParseError> {
        let mut base = self.api_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("{}/messages", self.domain))
    }
}
