//! Webhook orchestration.
//!
//! [`WebhookHandler`] is the single entry point for both webhook endpoints:
//! it authenticates the body, parses it into a [`ChangeEvent`], runs the
//! matching [`ChangeEventProcessor`] and fans the result out.
//!
//! - status updates go to the [`NotificationDispatcher`], awaited so the
//!   outcome can be reported,
//! - real-time updates go to the [`EventBroadcaster`], scheduled and never
//!   awaited.

use std::sync::Arc;

use kanau::processor::Processor;
use melotech_sdk::objects::{RealtimeUpdateResponse, StatusUpdateResponse};
use melotech_sdk::signature::{self, Verification};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::broadcaster::{EventBroadcaster, submission_update};
use crate::config::WebhookConfig;
use crate::events::{
    ChangeEvent, ChangeEventError, ChangeEventProcessor, DecisionReason, LiveUpdate,
    StatusNotification,
};
use crate::notify::{DispatchOutcome, NotificationDispatcher, StatusNotice};
use crate::registry::Room;
use crate::scheduler::Scheduler;

/// Title used in status emails when the row carries none.
pub const DEFAULT_SUBMISSION_TITLE: &str = "Your Submission";

/// Errors that reject a webhook request.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A signature was presented and did not match.
    #[error("Invalid webhook signature")]
    AuthenticationFailure,

    #[error("Invalid JSON payload")]
    MalformedInput(#[source] ChangeEventError),

    /// Anything else that stopped processing.
    #[error("Internal server error: {0}")]
    Unexpected(String),
}

pub struct WebhookHandler {
    config: Arc<RwLock<WebhookConfig>>,
    status: ChangeEventProcessor<StatusNotification>,
    live: ChangeEventProcessor<LiveUpdate>,
    dispatcher: NotificationDispatcher,
    broadcaster: EventBroadcaster,
}

impl WebhookHandler {
    pub fn new(
        config: Arc<RwLock<WebhookConfig>>,
        dispatcher: NotificationDispatcher,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            config,
            status: ChangeEventProcessor::new(StatusNotification),
            live: ChangeEventProcessor::new(LiveUpdate),
            dispatcher,
            broadcaster,
        }
    }

    async fn authenticate(&self, body: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let config = self.config.read().await;
        match signature::check(body, signature, config.secret_bytes()) {
            Verification::Verified => Ok(()),
            Verification::Skipped => {
                if config.secret.is_some() {
                    warn!("Webhook carries no signature, verification skipped");
                }
                Ok(())
            }
            Verification::Rejected => {
                warn!("Webhook signature rejected");
                Err(WebhookError::AuthenticationFailure)
            }
        }
    }

    async fn accept(&self, body: &[u8], signature: Option<&str>) -> Result<ChangeEvent, WebhookError> {
        self.authenticate(body, signature).await?;
        ChangeEvent::parse(body).map_err(|e| {
            warn!(error = %e, "Malformed webhook payload");
            WebhookError::MalformedInput(e)
        })
    }

    /// Handle `POST /webhook/submission-status-update`.
    ///
    /// Emails the submitter when the status moved into a notifiable value.
    #[tracing::instrument(skip_all, name = "webhook:status_update")]
    pub async fn handle_status_update(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<StatusUpdateResponse, WebhookError> {
        let event = self.accept(body, signature).await?;
        if !event.is_supported() {
            debug!(table = event.table_name(), "Ignoring unsupported table");
            return Ok(StatusUpdateResponse::unsupported_table(event.table_name()));
        }

        let processed = self.status.process(&event);
        let record = event.new_record();
        if !processed.decision.eligible {
            return Ok(match processed.decision.reason {
                DecisionReason::MissingRecipientKey => StatusUpdateResponse::Message {
                    message: StatusUpdateResponse::MISSING_USERID.to_owned(),
                },
                _ => StatusUpdateResponse::StatusUnchanged {
                    message: StatusUpdateResponse::STATUS_UNCHANGED.to_owned(),
                    old_status: event.old_record().status.clone(),
                    new_status: record.status.clone(),
                },
            });
        }

        let userid = record.userid.clone().unwrap_or_default();
        let title = record
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBMISSION_TITLE.to_owned());
        let status = record.status.clone().unwrap_or_default();
        let notice = StatusNotice {
            recipient_key: userid.clone(),
            decision: processed.decision,
            title: title.clone(),
            status: status.clone(),
            feedback: record.feedback.clone().unwrap_or_default(),
        };

        // A panic inside a collaborator surfaces as a join error.
        let dispatcher = self.dispatcher.clone();
        let outcome = tokio::spawn(async move { dispatcher.process(notice).await })
            .await
            .map_err(|e| {
                error!(error = %e, "Notification dispatch aborted");
                WebhookError::Unexpected(e.to_string())
            })?;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        };

        Ok(match outcome {
            DispatchOutcome::Sent { email } => StatusUpdateResponse::Notified {
                message: StatusUpdateResponse::SENT.to_owned(),
                user_email: email,
                submission_title: title,
                status,
            },
            DispatchOutcome::SendFailed { email } => StatusUpdateResponse::Notified {
                message: StatusUpdateResponse::SEND_FAILED.to_owned(),
                user_email: email,
                submission_title: title,
                status,
            },
            DispatchOutcome::RecipientNotFound => StatusUpdateResponse::RecipientNotFound {
                message: StatusUpdateResponse::RECIPIENT_NOT_FOUND.to_owned(),
                userid,
            },
            DispatchOutcome::Skipped => StatusUpdateResponse::StatusUnchanged {
                message: StatusUpdateResponse::STATUS_UNCHANGED.to_owned(),
                old_status: event.old_record().status.clone(),
                new_status: Some(status),
            },
        })
    }

    /// Handle `POST /webhook/submission-update`.
    ///
    /// Pushes changed rows to the admin room and to the submitter's own
    /// room. Returns before delivery completes.
    #[tracing::instrument(skip_all, name = "webhook:realtime_update")]
    pub async fn handle_realtime_update(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<RealtimeUpdateResponse, WebhookError> {
        let event = self.accept(body, signature).await?;
        if !event.is_supported() {
            debug!(table = event.table_name(), "Ignoring unsupported table");
            return Ok(RealtimeUpdateResponse::unsupported_table(event.table_name()));
        }

        let processed = self.live.process(&event);
        let update = submission_update(&event, &processed.diff);
        let broadcast = processed.decision.eligible;

        if broadcast {
            let mut rooms = vec![Room::admin()];
            if let Some(userid) = event.new_record().userid.as_deref().filter(|u| !u.is_empty()) {
                rooms.push(Room::artist(userid));
            }
            self.broadcaster
                .publish(&Scheduler::detect(), rooms, update.clone());
        } else {
            debug!("No tracked field changed, nothing to publish");
        }

        Ok(RealtimeUpdateResponse::Processed {
            message: RealtimeUpdateResponse::PROCESSED.to_owned(),
            submission_id: update.submission_id,
            title: update.title,
            updated_fields: update.updated_fields,
            new_data: update.new_data,
            timestamp: update.timestamp,
            broadcast,
        })
    }
}
