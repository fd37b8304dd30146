//! Settings service
//!
//! Manages application settings persistence using JSON file storage.
//! Acts as the schedule-config provider for the reminder commands.

use crate::config::{
    DEFAULT_EVENING_TIME, DEFAULT_MORNING_TIME, DEFAULT_TICK_INTERVAL_SECS,
    MAX_TICK_INTERVAL_SECS, MIN_TICK_INTERVAL_SECS, SETTINGS_FILE_NAME,
};
use crate::error::{AppError, Result};
use crate::services::collection::MissingMoodPolicy;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;

/// Date-specific substitution of the default reminder times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOverride {
    pub date: NaiveDate,
    #[serde(default)]
    pub morning_time: Option<NaiveTime>,
    #[serde(default)]
    pub evening_time: Option<NaiveTime>,
}

impl ScheduleOverride {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            morning_time: None,
            evening_time: None,
        }
    }

    pub fn has_override(&self) -> bool {
        self.morning_time.is_some() || self.evening_time.is_some()
    }
}

/// Morning/evening reminder thresholds plus per-date overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_morning_time")]
    pub morning_time: NaiveTime,
    #[serde(default = "default_evening_time")]
    pub evening_time: NaiveTime,
    #[serde(default)]
    pub overrides: Vec<ScheduleOverride>,
}

fn default_morning_time() -> NaiveTime {
    let (h, m) = DEFAULT_MORNING_TIME;
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

fn default_evening_time() -> NaiveTime {
    let (h, m) = DEFAULT_EVENING_TIME;
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            morning_time: default_morning_time(),
            evening_time: default_evening_time(),
            overrides: Vec::new(),
        }
    }
}

impl ScheduleConfig {
    pub fn override_for(&self, date: NaiveDate) -> Option<&ScheduleOverride> {
        self.overrides.iter().find(|o| o.date == date)
    }

    /// Morning threshold for `date`, honoring an override for that date
    pub fn morning_time_for(&self, date: NaiveDate) -> NaiveTime {
        self.override_for(date)
            .and_then(|o| o.morning_time)
            .unwrap_or(self.morning_time)
    }

    /// Evening threshold for `date`, honoring an override for that date
    pub fn evening_time_for(&self, date: NaiveDate) -> NaiveTime {
        self.override_for(date)
            .and_then(|o| o.evening_time)
            .unwrap_or(self.evening_time)
    }

    /// Insert or replace the override for its date.
    /// An override without any time removes the existing one.
    pub fn apply_override(&mut self, new_override: ScheduleOverride) {
        self.overrides.retain(|o| o.date != new_override.date);
        if new_override.has_override() {
            self.overrides.push(new_override);
            self.overrides.sort_by_key(|o| o.date);
        }
    }

    /// Drop overrides dated before `today`, returning how many were removed
    pub fn prune_expired(&mut self, today: NaiveDate) -> usize {
        let before = self.overrides.len();
        self.overrides.retain(|o| o.date >= today);
        before - self.overrides.len()
    }
}

/// Tick dispatcher behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// Seconds between ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// How auto-save treats a record with only one mood value
    #[serde(default)]
    pub missing_mood_policy: MissingMoodPolicy,
}

fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_SECS
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            missing_mood_policy: MissingMoodPolicy::default(),
        }
    }
}

impl DispatcherSettings {
    /// Tick period clamped to the supported range
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(
            self.tick_interval_secs
                .clamp(MIN_TICK_INTERVAL_SECS, MAX_TICK_INTERVAL_SECS),
        )
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub dispatcher: DispatcherSettings,
}

/// Service for managing application settings
///
/// Clones share one write lock, so the UI and the dispatcher never
/// interleave a load-modify-save on the settings file.
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE_NAME),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        let _guard = self.write_lock.lock().await;
        self.read_settings().await
    }

    /// Get the reminder schedule
    pub async fn load_schedule_config(&self) -> Result<ScheduleConfig> {
        let settings = self.load().await?;
        Ok(settings.schedule)
    }

    /// Update default reminder times and optionally add, replace or clear
    /// the override for one date
    pub async fn update_schedule_config(
        &self,
        morning_time: NaiveTime,
        evening_time: NaiveTime,
        new_override: Option<ScheduleOverride>,
    ) -> Result<ScheduleConfig> {
        if morning_time >= evening_time {
            return Err(AppError::Settings(format!(
                "Morning reminder ({}) must be earlier than evening reminder ({})",
                morning_time, evening_time
            )));
        }

        let _guard = self.write_lock.lock().await;
        let mut settings = self.read_settings().await?;
        settings.schedule.morning_time = morning_time;
        settings.schedule.evening_time = evening_time;
        if let Some(o) = new_override {
            tracing::info!("Setting schedule override for {}", o.date);
            settings.schedule.apply_override(o);
        }
        self.write_settings(&settings).await?;

        Ok(settings.schedule)
    }

    /// Remove overrides whose date has passed. Only writes when something changed.
    pub async fn cleanup_expired_overrides(&self, today: NaiveDate) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.read_settings().await?;
        let removed = settings.schedule.prune_expired(today);

        if removed > 0 {
            self.write_settings(&settings).await?;
            tracing::info!("Removed {} expired schedule overrides", removed);
        }

        Ok(removed)
    }

    // Callers hold `write_lock`
    async fn read_settings(&self) -> Result<AppSettings> {
        if !fs::try_exists(&self.settings_path).await? {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.write_settings(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Settings(format!("Failed to parse settings: {}", e)))
    }

    async fn write_settings(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::debug!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.schedule.morning_time, time(9, 0));
        assert_eq!(settings.schedule.evening_time, time(18, 0));
        assert!(settings.schedule.overrides.is_empty());
        assert_eq!(settings.dispatcher.tick_interval_secs, 30);
        assert_eq!(
            settings.dispatcher.missing_mood_policy,
            MissingMoodPolicy::LeaveUnset
        );
        assert!(temp.path().join(SETTINGS_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_serde_defaults() {
        let (service, temp) = create_test_service();
        std::fs::write(
            temp.path().join(SETTINGS_FILE_NAME),
            r#"{"schedule":{"morning_time":"07:30:00"}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.schedule.morning_time, time(7, 30));
        assert_eq!(settings.schedule.evening_time, time(18, 0));
        assert_eq!(settings.dispatcher.tick_interval_secs, 30);
    }

    #[tokio::test]
    async fn test_override_is_honored_for_its_date_only() {
        let (service, _temp) = create_test_service();

        let mut o = ScheduleOverride::new(date(10));
        o.morning_time = Some(time(11, 0));

        let config = service
            .update_schedule_config(time(9, 0), time(18, 0), Some(o))
            .await
            .unwrap();

        assert_eq!(config.morning_time_for(date(10)), time(11, 0));
        assert_eq!(config.evening_time_for(date(10)), time(18, 0));
        assert_eq!(config.morning_time_for(date(11)), time(9, 0));
    }

    #[tokio::test]
    async fn test_empty_override_clears_existing() {
        let (service, _temp) = create_test_service();

        let mut o = ScheduleOverride::new(date(10));
        o.evening_time = Some(time(20, 0));
        service
            .update_schedule_config(time(9, 0), time(18, 0), Some(o))
            .await
            .unwrap();

        let config = service
            .update_schedule_config(time(9, 0), time(18, 0), Some(ScheduleOverride::new(date(10))))
            .await
            .unwrap();

        assert!(config.overrides.is_empty());
    }

    #[tokio::test]
    async fn test_morning_must_precede_evening() {
        let (service, _temp) = create_test_service();

        let result = service
            .update_schedule_config(time(19, 0), time(18, 0), None)
            .await;

        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[tokio::test]
    async fn test_cleanup_expired_overrides_persists() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        {
            let service = SettingsService::new(dir.clone());
            for day in [1, 5, 9] {
                let mut o = ScheduleOverride::new(date(day));
                o.morning_time = Some(time(10, 0));
                service
                    .update_schedule_config(time(9, 0), time(18, 0), Some(o))
                    .await
                    .unwrap();
            }
            let removed = service.cleanup_expired_overrides(date(5)).await.unwrap();
            assert_eq!(removed, 1);
        }

        {
            let service = SettingsService::new(dir);
            let config = service.load_schedule_config().await.unwrap();
            let dates: Vec<NaiveDate> = config.overrides.iter().map(|o| o.date).collect();
            assert_eq!(dates, vec![date(5), date(9)]);
        }
    }

    #[tokio::test]
    async fn test_concurrent_updates_and_cleanup_keep_every_override() {
        let (service, _temp) = create_test_service();
        service
            .update_schedule_config(time(9, 0), time(18, 0), Some(expired_override()))
            .await
            .unwrap();

        let updates = (10..20).map(|day| {
            let service = service.clone();
            async move {
                let mut o = ScheduleOverride::new(date(day));
                o.evening_time = Some(time(19, 0));
                service
                    .update_schedule_config(time(9, 0), time(18, 0), Some(o))
                    .await
                    .map(|_| ())
            }
        });
        let cleanup = {
            let service = service.clone();
            async move { service.cleanup_expired_overrides(date(5)).await.map(|_| ()) }
        };

        let (updated, cleaned) = tokio::join!(futures::future::join_all(updates), cleanup);
        assert!(updated.into_iter().all(|r| r.is_ok()));
        cleaned.unwrap();

        let config = service.load_schedule_config().await.unwrap();
        let dates: Vec<NaiveDate> = config.overrides.iter().map(|o| o.date).collect();
        assert_eq!(dates, (10..20).map(date).collect::<Vec<_>>());
    }

    fn expired_override() -> ScheduleOverride {
        let mut o = ScheduleOverride::new(date(1));
        o.morning_time = Some(time(8, 0));
        o
    }

    #[test]
    fn test_tick_interval_is_clamped() {
        let settings = DispatcherSettings {
            tick_interval_secs: 0,
            ..DispatcherSettings::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_secs(1));

        let settings = DispatcherSettings {
            tick_interval_secs: 86_400,
            ..DispatcherSettings::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_secs(900));
    }
}
