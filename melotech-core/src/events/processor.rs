//! Notification eligibility.
//!
//! Both processing modes share the same diff and only differ in their
//! [`DecisionPolicy`]:
//!
//! | policy                 | eligible when                                  |
//! |------------------------|------------------------------------------------|
//! | [`StatusNotification`] | status moved into accepted / rejected / pending |
//! | [`LiveUpdate`]         | any of status, rating, feedback changed         |

use std::str::FromStr;

use melotech_sdk::objects::TrackedField;

use super::diff::FieldDiff;
use super::types::ChangeEvent;

/// Statuses that trigger an email when a submission moves into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifiableStatus {
    Accepted,
    Rejected,
    Pending,
}

impl NotifiableStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NotifiableStatus::Accepted => "accepted",
            NotifiableStatus::Rejected => "rejected",
            NotifiableStatus::Pending => "pending",
        }
    }
}

impl FromStr for NotifiableStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(NotifiableStatus::Accepted),
            "rejected" => Ok(NotifiableStatus::Rejected),
            "pending" => Ok(NotifiableStatus::Pending),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for NotifiableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a change was or was not found eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// Status moved into a notifiable value.
    StatusChanged,
    /// Status stayed the same, or moved into an unrecognised value.
    StatusUnchanged,
    /// The event comes from a table this service does not handle.
    UnsupportedTable,
    /// The status changed but the row names no recipient.
    MissingRecipientKey,
    /// At least one tracked field changed.
    TrackedFieldsChanged,
    /// No tracked field changed.
    NoTrackedChange,
}

/// Outcome of a [`DecisionPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationDecision {
    pub eligible: bool,
    pub reason: DecisionReason,
}

impl NotificationDecision {
    pub fn eligible(reason: DecisionReason) -> Self {
        Self {
            eligible: true,
            reason,
        }
    }

    pub fn ineligible(reason: DecisionReason) -> Self {
        Self {
            eligible: false,
            reason,
        }
    }
}

/// Decides whether a supported change is notification-worthy.
pub trait DecisionPolicy: Send + Sync {
    fn decide(&self, event: &ChangeEvent, diff: &FieldDiff) -> NotificationDecision;
}

/// Email gate: a status transition into a [`NotifiableStatus`] with a
/// known recipient.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusNotification;

impl DecisionPolicy for StatusNotification {
    fn decide(&self, event: &ChangeEvent, diff: &FieldDiff) -> NotificationDecision {
        let moved_into_notifiable = diff.contains(TrackedField::Status)
            && diff
                .after
                .status
                .as_deref()
                .is_some_and(|s| s.parse::<NotifiableStatus>().is_ok());

        if !moved_into_notifiable {
            return NotificationDecision::ineligible(DecisionReason::StatusUnchanged);
        }
        if event.new_record().userid.as_deref().is_none_or(str::is_empty) {
            return NotificationDecision::ineligible(DecisionReason::MissingRecipientKey);
        }
        NotificationDecision::eligible(DecisionReason::StatusChanged)
    }
}

/// Broadcast gate: any tracked field changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveUpdate;

impl DecisionPolicy for LiveUpdate {
    fn decide(&self, _event: &ChangeEvent, diff: &FieldDiff) -> NotificationDecision {
        if diff.is_empty() {
            NotificationDecision::ineligible(DecisionReason::NoTrackedChange)
        } else {
            NotificationDecision::eligible(DecisionReason::TrackedFieldsChanged)
        }
    }
}

/// Diff plus decision for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedChange {
    /// Empty for unsupported tables.
    pub diff: FieldDiff,
    pub decision: NotificationDecision,
}

/// Computes the tracked-field diff of an event and applies a policy to it.
#[derive(Debug, Clone, Default)]
pub struct ChangeEventProcessor<P> {
    policy: P,
}

impl<P: DecisionPolicy> ChangeEventProcessor<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    pub fn process(&self, event: &ChangeEvent) -> ProcessedChange {
        if !event.is_supported() {
            return ProcessedChange {
                diff: FieldDiff::default(),
                decision: NotificationDecision::ineligible(DecisionReason::UnsupportedTable),
            };
        }

        let diff = FieldDiff::between(event.old_record(), event.new_record());
        let decision = self.policy.decide(event, &diff);
        ProcessedChange { diff, decision }
    }
}
