//! Mood store
//!
//! One SQLite file holds every day's mood entry. `open_mood_store` brings
//! the schema up to date and checks the mood range constraints before the
//! pool is handed to the repository.

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::migrate;

use crate::config::{DB_BUSY_TIMEOUT_SECS, DB_MAX_CONNECTIONS};
use crate::error::Result;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Open (creating if needed) the mood store at `db_path`
pub async fn open_mood_store(db_path: &Path) -> Result<SqlitePool> {
    if let Some(dir) = db_path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    // WAL + NORMAL survives a process crash; only power loss can drop the last commit
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS));

    let pool = SqlitePoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    let version = migrate(&pool).await?;
    tracing::info!(path = %db_path.display(), version, "Mood store opened");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_created_in_missing_directory_and_reopened() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("profile").join("moods.db");
        let date = NaiveDate::from_ymd_opt(2024, 3, 18).unwrap();

        let pool = open_mood_store(&path).await.unwrap();
        Repository::new(pool.clone())
            .upsert_mood_entry(&MoodRecord::new(date).with_start_of_work(4))
            .await
            .unwrap();
        pool.close().await;

        let pool = open_mood_store(&path).await.unwrap();
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let entry = Repository::new(pool).get_mood_entry(date).await.unwrap();
        assert_eq!(entry.unwrap().start_of_work, Some(4));
    }
}
