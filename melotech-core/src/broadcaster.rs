//! Turns processed change events into live update messages.

use std::sync::Arc;

use melotech_sdk::objects::{SubmissionUpdate, TrackedValues, WsServerMessage};
use tracing::{debug, error};

use crate::events::{ChangeEvent, FieldDiff};
use crate::registry::{ConnectionRegistry, Room};
use crate::scheduler::Schedule;

/// Title used when the row carries none.
pub const DEFAULT_TITLE: &str = "Unknown Title";

/// Build the update payload for one change.
///
/// `new_data.feedback` defaults to an empty string, the way the dashboard
/// expects it.
pub fn submission_update(event: &ChangeEvent, diff: &FieldDiff) -> SubmissionUpdate {
    let record = event.new_record();
    SubmissionUpdate {
        submission_id: record.id.clone(),
        title: record
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
        updated_fields: diff.changed_fields.clone(),
        new_data: TrackedValues {
            feedback: Some(diff.after.feedback.clone().unwrap_or_default()),
            ..diff.after.clone()
        },
        timestamp: record.updated_at.clone(),
    }
}

/// Publishes updates to registry rooms without blocking the caller.
#[derive(Clone)]
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Serialize `update` and hand its delivery to every room in `rooms`
    /// to `scheduler`.
    ///
    /// Errors are logged, never returned.
    pub fn publish(&self, scheduler: &dyn Schedule, rooms: Vec<Room>, update: SubmissionUpdate) {
        let message = WsServerMessage::SubmissionUpdate {
            data: update,
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
        };
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to serialize live update");
                return;
            }
        };

        let registry = Arc::clone(&self.registry);
        scheduler.schedule(Box::pin(async move {
            for room in rooms {
                let report = registry.broadcast(&room, &text).await;
                debug!(
                    room = %room,
                    delivered = report.delivered,
                    pruned = report.pruned,
                    "Live update published"
                );
            }
        }));
    }
}
