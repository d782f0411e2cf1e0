//! Typed change event built from a raw webhook body.

use melotech_sdk::objects::{ChangeEventPayload, SubmissionRecord};
use thiserror::Error;

/// The only table whose changes this service understands.
pub const SUBMISSIONS_TABLE: &str = "submissions";

/// Errors raised while turning a webhook body into a [`ChangeEvent`].
#[derive(Debug, Error)]
pub enum ChangeEventError {
    /// The body is not JSON, or not the expected envelope.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// A submission row has a column of the wrong type.
    #[error("invalid {which} record: {source}")]
    InvalidRecord {
        which: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One row change reported by the data store.
///
/// Immutable once parsed. Rows of tables other than [`SUBMISSIONS_TABLE`]
/// are not decoded and both records are left empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    table_name: String,
    old_record: SubmissionRecord,
    new_record: SubmissionRecord,
}

impl ChangeEvent {
    /// Build an event directly from typed rows.
    pub fn new(
        table_name: impl Into<String>,
        old_record: SubmissionRecord,
        new_record: SubmissionRecord,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            old_record,
            new_record,
        }
    }

    /// Parse and validate a raw webhook body.
    ///
    /// Only the envelope of a submissions change is checked strictly. For
    /// any other table the `table` value is taken as is (non-string values
    /// by their JSON text) and the records are not looked at.
    pub fn parse(body: &[u8]) -> Result<Self, ChangeEventError> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(ChangeEventError::InvalidJson)?;

        if let Some(envelope) = value.as_object() {
            let table = match envelope.get("table") {
                Some(serde_json::Value::String(table)) => table.clone(),
                None | Some(serde_json::Value::Null) => String::new(),
                Some(other) => other.to_string(),
            };
            if table != SUBMISSIONS_TABLE {
                return Ok(Self::new(
                    table,
                    SubmissionRecord::default(),
                    SubmissionRecord::default(),
                ));
            }
        }

        let payload: ChangeEventPayload =
            serde_json::from_value(value).map_err(ChangeEventError::InvalidJson)?;
        Self::try_from(payload)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn old_record(&self) -> &SubmissionRecord {
        &self.old_record
    }

    pub fn new_record(&self) -> &SubmissionRecord {
        &self.new_record
    }

    /// Whether this event comes from a table this service understands.
    pub fn is_supported(&self) -> bool {
        self.table_name == SUBMISSIONS_TABLE
    }
}

impl TryFrom<ChangeEventPayload> for ChangeEvent {
    type Error = ChangeEventError;

    fn try_from(payload: ChangeEventPayload) -> Result<Self, Self::Error> {
        if payload.table != SUBMISSIONS_TABLE {
            return Ok(Self::new(
                payload.table,
                SubmissionRecord::default(),
                SubmissionRecord::default(),
            ));
        }

        let new_record = decode_record("new", payload.record)?;
        let old_record = decode_record("old", payload.old_record)?;

        Ok(Self::new(payload.table, old_record, new_record))
    }
}

fn decode_record(
    which: &'static str,
    map: serde_json::Map<String, serde_json::Value>,
) -> Result<SubmissionRecord, ChangeEventError> {
    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|source| ChangeEventError::InvalidRecord { which, source })
}
