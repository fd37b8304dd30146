//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to event consumers.

use crate::config::{MAX_MOOD, MIN_MOOD};
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One day's mood entry.
///
/// A record is keyed by its calendar date; both mood values are optional
/// because the user fills them in at different times of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MoodRecord {
    pub date: NaiveDate,
    /// Mood recorded at the start of the work day (1-10)
    pub start_of_work: Option<u8>,
    /// Mood recorded at the end of the work day (1-10)
    pub end_of_work: Option<u8>,
    pub last_modified: DateTime<Utc>,
}

impl MoodRecord {
    /// Empty record for `date`, stamped now
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            start_of_work: None,
            end_of_work: None,
            last_modified: Utc::now(),
        }
    }

    pub fn with_start_of_work(mut self, mood: u8) -> Self {
        self.start_of_work = Some(mood);
        self
    }

    pub fn with_end_of_work(mut self, mood: u8) -> Self {
        self.end_of_work = Some(mood);
        self
    }

    /// True when at least one mood value has been recorded
    pub fn should_persist(&self) -> bool {
        self.start_of_work.is_some() || self.end_of_work.is_some()
    }

    /// Mean of the recorded values, `None` if nothing was recorded
    pub fn average_mood(&self) -> Option<f64> {
        let values: Vec<f64> = [self.start_of_work, self.end_of_work]
            .into_iter()
            .flatten()
            .map(f64::from)
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    /// Check every recorded value is inside the mood scale
    pub fn validate(&self) -> Result<()> {
        check_mood("start_of_work", self.start_of_work)?;
        check_mood("end_of_work", self.end_of_work)?;
        Ok(())
    }
}

fn check_mood(field: &'static str, value: Option<u8>) -> Result<()> {
    match value {
        Some(v) if !(MIN_MOOD..=MAX_MOOD).contains(&v) => Err(AppError::InvalidMood {
            field,
            value: v,
            min: MIN_MOOD,
            max: MAX_MOOD,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    #[test]
    fn test_empty_record_is_not_persisted() {
        let record = MoodRecord::new(day());
        assert!(!record.should_persist());
        assert_eq!(record.average_mood(), None);
    }

    #[test]
    fn test_single_value_persists() {
        let record = MoodRecord::new(day()).with_end_of_work(4);
        assert!(record.should_persist());
        assert_eq!(record.average_mood(), Some(4.0));
    }

    #[test]
    fn test_average_of_both_values() {
        let record = MoodRecord::new(day())
            .with_start_of_work(7)
            .with_end_of_work(8);
        assert_eq!(record.average_mood(), Some(7.5));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(MoodRecord::new(day()).with_start_of_work(0).validate().is_err());
        assert!(MoodRecord::new(day()).with_end_of_work(11).validate().is_err());
        assert!(MoodRecord::new(day())
            .with_start_of_work(1)
            .with_end_of_work(10)
            .validate()
            .is_ok());
    }
}
