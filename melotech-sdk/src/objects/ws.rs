//! Streaming message types for the live update endpoints.
//!
//! `GET /ws/admin` and `GET /ws/artist/{user_id}` upgrade to a WebSocket.
//!
//! # Protocol
//!
//! 1. The server pushes a [`WsServerMessage`] JSON frame for every
//!    tracked-field change of a submission visible to the room.
//! 2. Any text the client sends is answered with `Echo: {text}` as a
//!    plain (non-JSON) text frame. There is no other client protocol.

use serde::{Deserialize, Serialize};

use super::submission::{SubmissionId, TrackedFields, TrackedValues};

/// Server-to-client WebSocket message.
///
/// ```json
/// {"type":"submission_update","data":{ ... },"timestamp":1700000000}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    SubmissionUpdate {
        data: SubmissionUpdate,
        /// Unix time at which the message was built.
        timestamp: i64,
    },
}

/// A change to one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionUpdate {
    pub submission_id: Option<SubmissionId>,
    pub title: String,
    pub updated_fields: TrackedFields,
    pub new_data: TrackedValues,
    /// The row's own `updated_at`, verbatim.
    pub timestamp: Option<String>,
}

/// Prefix of the reply to client text frames.
pub const ECHO_PREFIX: &str = "Echo: ";
