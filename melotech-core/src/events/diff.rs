//! Tracked-field comparison between two versions of a row.

use melotech_sdk::objects::{SubmissionRecord, TrackedField, TrackedFields, TrackedValues};

/// Which tracked columns changed, with their values on both sides.
///
/// Columns outside [`TrackedField::ALL`] never appear, even when they
/// changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDiff {
    pub changed_fields: TrackedFields,
    pub before: TrackedValues,
    pub after: TrackedValues,
}

impl FieldDiff {
    /// Compare the tracked columns of `old` and `new`.
    pub fn between(old: &SubmissionRecord, new: &SubmissionRecord) -> Self {
        let before = old.tracked();
        let after = new.tracked();
        let changed_fields = TrackedField::ALL
            .into_iter()
            .filter(|field| !before.same(&after, *field))
            .collect();
        Self {
            changed_fields,
            before,
            after,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields.is_empty()
    }

    pub fn contains(&self, field: TrackedField) -> bool {
        self.changed_fields.contains(&field)
    }
}
