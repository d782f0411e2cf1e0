pub mod health;
pub mod submission;
pub mod webhook;
pub mod ws;

pub use health::HealthResponse;
pub use submission::{
    ChangeEventPayload, SubmissionId, SubmissionRecord, TrackedField, TrackedFields,
    TrackedValues,
};
pub use webhook::{RealtimeUpdateResponse, StatusUpdateResponse, WebhookAck};
pub use ws::{SubmissionUpdate, WsServerMessage};
