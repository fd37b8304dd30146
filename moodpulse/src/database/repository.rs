//! Repository layer for database operations
//!
//! This module provides persistence for mood entries.
//! The in-memory collection decides what to write; the repository only stores it.

use super::models::*;
use crate::error::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a mood entry or replace the stored one for the same date
    pub async fn upsert_mood_entry(&self, record: &MoodRecord) -> Result<MoodRecord> {
        let stored = sqlx::query_as::<_, MoodRecord>(
            r#"
            INSERT INTO mood_entries (date, start_of_work, end_of_work, last_modified)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET
                start_of_work = excluded.start_of_work,
                end_of_work = excluded.end_of_work,
                last_modified = excluded.last_modified
            RETURNING *
            "#,
        )
        .bind(record.date)
        .bind(record.start_of_work)
        .bind(record.end_of_work)
        .bind(record.last_modified)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Stored mood entry for {}", record.date);
        Ok(stored)
    }

    /// Get the mood entry for a date
    pub async fn get_mood_entry(&self, date: NaiveDate) -> Result<Option<MoodRecord>> {
        let record = sqlx::query_as::<_, MoodRecord>(
            r#"
            SELECT * FROM mood_entries WHERE date = ?
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List all mood entries, most recent first
    pub async fn list_mood_entries(&self) -> Result<Vec<MoodRecord>> {
        let records = sqlx::query_as::<_, MoodRecord>(
            r#"
            SELECT * FROM mood_entries ORDER BY date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::migrate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_repo() -> Repository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        migrate(&pool).await.unwrap();

        Repository::new(pool)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_get_entry() {
        let repo = create_test_repo().await;

        let record = MoodRecord::new(date(1)).with_start_of_work(6);
        repo.upsert_mood_entry(&record).await.unwrap();

        let fetched = repo.get_mood_entry(date(1)).await.unwrap().unwrap();
        assert_eq!(fetched.start_of_work, Some(6));
        assert_eq!(fetched.end_of_work, None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let repo = create_test_repo().await;

        repo.upsert_mood_entry(&MoodRecord::new(date(2)).with_start_of_work(3))
            .await
            .unwrap();
        repo.upsert_mood_entry(
            &MoodRecord::new(date(2))
                .with_start_of_work(3)
                .with_end_of_work(9),
        )
        .await
        .unwrap();

        let entries = repo.list_mood_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].end_of_work, Some(9));
    }

    #[tokio::test]
    async fn test_missing_entry_is_none() {
        let repo = create_test_repo().await;
        assert!(repo.get_mood_entry(date(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let repo = create_test_repo().await;

        for day in [4, 9, 6] {
            repo.upsert_mood_entry(&MoodRecord::new(date(day)).with_end_of_work(5))
                .await
                .unwrap();
        }

        let dates: Vec<NaiveDate> = repo
            .list_mood_entries()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![date(9), date(6), date(4)]);
    }
}
