//! Submission rows as delivered by the data store's change webhooks.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Raw webhook body.
///
/// ```json
/// {"table":"submissions","record":{ ... },"old_record":{ ... }}
/// ```
///
/// Records are kept as JSON objects here; only rows of a recognised table
/// are decoded further into [`SubmissionRecord`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeEventPayload {
    #[serde(default)]
    pub table: String,
    #[serde(default, alias = "new_record", deserialize_with = "object_or_null")]
    pub record: serde_json::Map<String, serde_json::Value>,
    #[serde(default, deserialize_with = "object_or_null")]
    pub old_record: serde_json::Map<String, serde_json::Value>,
}

fn object_or_null<'de, D>(
    deserializer: D,
) -> Result<serde_json::Map<String, serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?
        .unwrap_or_default())
}

/// Primary key of a submission row.
///
/// Stores may hand out integer or text (uuid) keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionId {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionId::Int(id) => write!(f, "{id}"),
            SubmissionId::Text(id) => f.write_str(id),
        }
    }
}

/// The columns of a submission row this service cares about.
///
/// Unknown columns are ignored; every known column is optional because the
/// store omits columns it did not load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(default)]
    pub id: Option<SubmissionId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rating: Option<serde_json::Number>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub userid: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl SubmissionRecord {
    /// Project the tracked columns.
    pub fn tracked(&self) -> TrackedValues {
        TrackedValues {
            status: self.status.clone(),
            rating: self.rating.clone(),
            feedback: self.feedback.clone(),
        }
    }
}

/// A column whose changes are reported to live subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Status,
    Rating,
    Feedback,
}

impl TrackedField {
    /// All tracked fields, in reporting order.
    pub const ALL: [TrackedField; 3] = [
        TrackedField::Status,
        TrackedField::Rating,
        TrackedField::Feedback,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackedField::Status => "status",
            TrackedField::Rating => "rating",
            TrackedField::Feedback => "feedback",
        }
    }
}

impl std::fmt::Display for TrackedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Changed-field list. At most three entries, so it never spills.
pub type TrackedFields = SmallVec<[TrackedField; 3]>;

/// Values of the tracked columns at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackedValues {
    pub status: Option<String>,
    pub rating: Option<serde_json::Number>,
    pub feedback: Option<String>,
}

impl TrackedValues {
    /// Whether `field` holds the same value in both snapshots.
    pub fn same(&self, other: &TrackedValues, field: TrackedField) -> bool {
        match field {
            TrackedField::Status => self.status == other.status,
            TrackedField::Rating => self.rating == other.rating,
            TrackedField::Feedback => self.feedback == other.feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_parsing() {
        let json = r#"{
            "table": "submissions",
            "type": "UPDATE",
            "record": {"id": 7, "status": "accepted", "rating": 8, "userid": "u1", "extra": true},
            "old_record": null
        }"#;
        let payload: ChangeEventPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.table, "submissions");
        assert!(payload.old_record.is_empty());

        let record: SubmissionRecord =
            serde_json::from_value(serde_json::Value::Object(payload.record)).unwrap();
        assert_eq!(record.id, Some(SubmissionId::Int(7)));
        assert_eq!(record.status.as_deref(), Some("accepted"));
        assert_eq!(record.rating, Some(8.into()));
        assert_eq!(record.feedback, None);
    }

    #[test]
    fn test_new_record_alias() {
        let json = r#"{"table":"submissions","new_record":{"status":"pending"}}"#;
        let payload: ChangeEventPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.record["status"], "pending");
    }

    #[test]
    fn test_tracked_field_serialization() {
        let fields: TrackedFields = TrackedField::ALL.into_iter().collect();
        assert_eq!(
            serde_json::to_string(&fields).unwrap(),
            r#"["status","rating","feedback"]"#
        );
    }

    #[test]
    fn test_submission_id_display() {
        assert_eq!(SubmissionId::Int(42).to_string(), "42");
        assert_eq!(
            SubmissionId::Text("test-submission-123".into()).to_string(),
            "test-submission-123"
        );
    }
}
