use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use melotech_core::webhook::WebhookError;
use melotech_sdk::objects::{RealtimeUpdateResponse, StatusUpdateResponse};
use melotech_sdk::signature::SIGNATURE_HEADER;
use serde::Serialize;

use crate::state::AppState;

/// `POST /webhook/submission-status-update`
pub(super) async fn submission_status_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusUpdateResponse>, WebhookApiError> {
    let response = state
        .webhooks
        .handle_status_update(&body, signature(&headers)?)
        .await?;
    Ok(Json(response))
}

/// `POST /webhook/submission-update`
pub(super) async fn submission_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RealtimeUpdateResponse>, WebhookApiError> {
    let response = state
        .webhooks
        .handle_realtime_update(&body, signature(&headers)?)
        .await?;
    Ok(Json(response))
}

/// The presented signature, if any.
///
/// A header that is present but not valid text can never match and fails
/// authentication.
fn signature(headers: &HeaderMap) -> Result<Option<&str>, WebhookApiError> {
    headers
        .get(SIGNATURE_HEADER)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| WebhookApiError(WebhookError::AuthenticationFailure))
        })
        .transpose()
}

/// Rejection of a webhook request.
#[derive(Debug)]
pub(super) struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WebhookError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            WebhookError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            WebhookError::Unexpected(e) => {
                tracing::error!(error = %e, "Webhook processing failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
