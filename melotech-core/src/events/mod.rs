//! Change events and the decisions derived from them.
//!
//! # Flow
//!
//! 1. A webhook body is parsed into a [`ChangeEvent`] (strict, typed).
//! 2. [`FieldDiff`] compares the tracked columns of the old and new row.
//! 3. A [`ChangeEventProcessor`] applies its [`DecisionPolicy`] to decide
//!    whether the change is worth a notification:
//!    - [`StatusNotification`] gates the email side-effect,
//!    - [`LiveUpdate`] gates the broadcast to streaming subscribers.

pub mod diff;
pub mod processor;
pub mod types;

pub use diff::FieldDiff;
pub use processor::{
    ChangeEventProcessor, DecisionPolicy, DecisionReason, LiveUpdate, NotifiableStatus,
    NotificationDecision, ProcessedChange, StatusNotification,
};
pub use types::{ChangeEvent, ChangeEventError, SUBMISSIONS_TABLE};
