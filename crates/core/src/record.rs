//! Audit metadata embedded in every ledger record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Audit timestamps and the soft-delete flag.
///
/// Aggregates embed this and stamp it from the `occurred_at` of the events
/// they apply, so replaying the same events yields the same metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ValueObject for RecordMeta {}

impl RecordMeta {
    pub fn created(at: DateTime<Utc>) -> Self {
        Self {
            created_at: Some(at),
            updated_at: Some(at),
            deleted_at: None,
        }
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        if self.created_at.is_none() {
            self.created_at = Some(at);
        }
        self.updated_at = Some(at);
    }

    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.touch(at);
        self.deleted_at = Some(at);
    }

    /// Soft-deleted records stay in the store but are excluded from active queries.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn touch_keeps_creation_time() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut meta = RecordMeta::created(t0);
        meta.touch(t1);
        assert_eq!(meta.created_at, Some(t0));
        assert_eq!(meta.updated_at, Some(t1));
        assert!(!meta.is_deleted());
    }

    #[test]
    fn soft_delete_sets_flag() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut meta = RecordMeta::created(t0);
        meta.mark_deleted(t0);
        assert!(meta.is_deleted());
    }
}
