//! Response bodies of the two webhook endpoints.

use serde::{Deserialize, Serialize};

use super::submission::{SubmissionId, TrackedFields, TrackedValues};

/// Response of `POST /webhook/submission-status-update`.
///
/// Every variant carries a human-readable `message`; the remaining fields
/// depend on how far processing got.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusUpdateResponse {
    /// An email was attempted (`message` tells whether it was sent).
    Notified {
        message: String,
        user_email: String,
        submission_title: String,
        status: String,
    },
    /// The recipient could not be resolved to an address.
    RecipientNotFound { message: String, userid: String },
    /// The status did not move into a notifiable value.
    StatusUnchanged {
        message: String,
        old_status: Option<String>,
        new_status: Option<String>,
    },
    /// Anything that only needs a message (unsupported table, missing user).
    Message { message: String },
}

impl StatusUpdateResponse {
    pub const SENT: &'static str = "Email notification sent successfully";
    pub const SEND_FAILED: &'static str = "Failed to send email notification";
    pub const RECIPIENT_NOT_FOUND: &'static str = "User email not found";
    pub const MISSING_USERID: &'static str = "No userid found in submission record";
    pub const STATUS_UNCHANGED: &'static str = "Status not changed or not a valid status update";

    pub fn unsupported_table(table: &str) -> Self {
        Self::Message {
            message: format!("Unsupported table: {table}"),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Notified { message, .. }
            | Self::RecipientNotFound { message, .. }
            | Self::StatusUnchanged { message, .. }
            | Self::Message { message } => message,
        }
    }
}

/// Response of `POST /webhook/submission-update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RealtimeUpdateResponse {
    Processed {
        message: String,
        submission_id: Option<SubmissionId>,
        title: String,
        updated_fields: TrackedFields,
        new_data: TrackedValues,
        timestamp: Option<String>,
        /// Whether a live update was scheduled for subscribers.
        broadcast: bool,
    },
    Message {
        message: String,
    },
}

impl RealtimeUpdateResponse {
    pub const PROCESSED: &'static str = "Real-time submission update processed";

    pub fn unsupported_table(table: &str) -> Self {
        Self::Message {
            message: format!("Unsupported table for real-time updates: {table}"),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Processed { message, .. } | Self::Message { message } => message,
        }
    }
}

/// Minimal view of either webhook response, as read by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub message: String,
}
