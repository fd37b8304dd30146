//! Mood collection
//!
//! In-memory aggregate of mood records, unique by date and iterated
//! most-recent-first. Owns the merge rules applied on every save.

use crate::database::MoodRecord;
use crate::error::Result;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What auto-save does with a record that has exactly one mood value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMoodPolicy {
    /// Keep the missing value unset
    #[default]
    LeaveUnset,
    /// Copy the recorded value into the missing one
    MirrorRecorded,
}

impl MissingMoodPolicy {
    fn apply(self, record: &mut MoodRecord) {
        match self {
            MissingMoodPolicy::LeaveUnset => {}
            MissingMoodPolicy::MirrorRecorded => match (record.start_of_work, record.end_of_work) {
                (Some(start), None) => record.end_of_work = Some(start),
                (None, Some(end)) => record.start_of_work = Some(end),
                _ => {}
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MoodCollection {
    entries: BTreeMap<NaiveDate, MoodRecord>,
    missing_mood_policy: MissingMoodPolicy,
}

impl MoodCollection {
    pub fn new(missing_mood_policy: MissingMoodPolicy) -> Self {
        Self {
            entries: BTreeMap::new(),
            missing_mood_policy,
        }
    }

    /// Build a collection from stored records. Later duplicates of a date win.
    pub fn from_records(
        records: impl IntoIterator<Item = MoodRecord>,
        missing_mood_policy: MissingMoodPolicy,
    ) -> Self {
        let entries = records.into_iter().map(|r| (r.date, r)).collect();
        Self {
            entries,
            missing_mood_policy,
        }
    }

    /// Compute what storing `record` would produce, without changing the collection.
    ///
    /// Returns `None` when the record is empty and no entry exists for its
    /// date. Set fields on the incoming record overwrite stored ones; unset
    /// fields keep the stored value. The result is always stamped now.
    pub fn merge(
        &self,
        record: MoodRecord,
        use_auto_save_defaults: bool,
    ) -> Result<Option<MoodRecord>> {
        record.validate()?;

        let mut merged = match self.entries.get(&record.date) {
            None if !record.should_persist() => return Ok(None),
            None => record,
            Some(existing) => MoodRecord {
                date: existing.date,
                start_of_work: record.start_of_work.or(existing.start_of_work),
                end_of_work: record.end_of_work.or(existing.end_of_work),
                last_modified: existing.last_modified,
            },
        };

        if use_auto_save_defaults {
            self.missing_mood_policy.apply(&mut merged);
        }
        merged.last_modified = Utc::now();

        Ok(Some(merged))
    }

    /// Insert or merge `record` into the entry for its date.
    /// Returns the stored record when the collection changed.
    pub fn add_or_update(
        &mut self,
        record: MoodRecord,
        use_auto_save_defaults: bool,
    ) -> Result<Option<MoodRecord>> {
        let merged = self.merge(record, use_auto_save_defaults)?;
        if let Some(ref r) = merged {
            self.put(r.clone());
        }
        Ok(merged)
    }

    /// Store an already merged record as-is
    pub(crate) fn put(&mut self, record: MoodRecord) {
        self.entries.insert(record.date, record);
    }

    pub fn get_entry(&self, date: NaiveDate) -> Option<&MoodRecord> {
        self.entries.get(&date)
    }

    /// All entries, most recent first
    pub fn entries(&self) -> impl Iterator<Item = &MoodRecord> {
        self.entries.values().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
