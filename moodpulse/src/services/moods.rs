//! Moods service
//!
//! Mood store collaborator used by the UI and by auto-save.
//! Keeps the in-memory collection and the database in step.

use crate::database::{MoodRecord, Repository};
use crate::error::Result;
use crate::services::collection::{MissingMoodPolicy, MoodCollection};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Service for reading and saving mood entries
#[derive(Clone)]
pub struct MoodsService {
    repo: Repository,
    collection: Arc<RwLock<MoodCollection>>,
}

impl MoodsService {
    /// Hydrate the collection from the database
    pub async fn load(repo: Repository, missing_mood_policy: MissingMoodPolicy) -> Result<Self> {
        let records = repo.list_mood_entries().await?;
        tracing::info!("Loaded {} mood entries", records.len());

        Ok(Self {
            repo,
            collection: Arc::new(RwLock::new(MoodCollection::from_records(
                records,
                missing_mood_policy,
            ))),
        })
    }

    /// Merge `record` into the entry for its date and persist the result.
    ///
    /// The database is written before the collection changes, so a failed
    /// write leaves both untouched.
    pub async fn add_or_update(
        &self,
        record: MoodRecord,
        use_auto_save_defaults: bool,
    ) -> Result<Option<MoodRecord>> {
        let mut collection = self.collection.write().await;

        let Some(merged) = collection.merge(record, use_auto_save_defaults)? else {
            tracing::debug!("Skipping empty mood record");
            return Ok(None);
        };

        let stored = self.repo.upsert_mood_entry(&merged).await?;
        collection.put(stored.clone());

        tracing::info!(
            "Saved mood entry for {} (start: {:?}, end: {:?})",
            stored.date,
            stored.start_of_work,
            stored.end_of_work
        );

        Ok(Some(stored))
    }

    pub async fn get_entry(&self, date: NaiveDate) -> Option<MoodRecord> {
        self.collection.read().await.get_entry(date).cloned()
    }

    /// All entries, most recent first
    pub async fn list_entries(&self) -> Vec<MoodRecord> {
        self.collection.read().await.entries().cloned().collect()
    }
}
