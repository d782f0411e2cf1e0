//! Webhook sender (data store side → MeloTech server).
//!
//! Useful for replaying change events against a running server. Bodies are
//! signed with the shared secret when one is set.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{ChangeEventPayload, HealthResponse, WebhookAck};
use crate::signature::{SIGNATURE_HEADER, sign_body};

/// Typed HTTP client for the webhook and health endpoints.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: Client,
    base_url: Url,
    secret: Option<Vec<u8>>,
}

impl WebhookClient {
    /// Create a new `WebhookClient`.
    ///
    /// * `base_url` – root URL of the server.
    /// * `secret` – shared webhook secret; `None` sends unsigned bodies.
    pub fn new(base_url: Url, secret: Option<impl Into<Vec<u8>>>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            secret: secret.map(Into::into),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /webhook/submission-status-update` – email notification path.
    pub async fn send_status_update(
        &self,
        payload: &ChangeEventPayload,
    ) -> Result<WebhookAck, ClientError> {
        self.post_signed("/webhook/submission-status-update", payload)
            .await
    }

    /// `POST /webhook/submission-update` – live update path.
    pub async fn send_realtime_update(
        &self,
        payload: &ChangeEventPayload,
    ) -> Result<WebhookAck, ClientError> {
        self.post_signed("/webhook/submission-update", payload).await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.base_url.join("/health")?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    async fn post_signed(
        &self,
        path: &str,
        payload: &ChangeEventPayload,
    ) -> Result<WebhookAck, ClientError> {
        let url = self.base_url.join(path)?;
        let body = serde_json::to_vec(payload)?;

        let mut request = self
            .http
            .post(url)
            .header("Content-Type", "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign_body(&body, secret));
        }

        let resp = request.body(body).send().await?;
        parse_response(resp).await
    }
}
