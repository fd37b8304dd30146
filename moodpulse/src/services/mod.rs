//! Services module
//!
//! Business logic services that sit between the dispatcher and storage.

pub mod collection;
pub mod moods;
pub mod settings;

pub use collection::{MissingMoodPolicy, MoodCollection};
pub use moods::MoodsService;
pub use settings::{
    AppSettings, DispatcherSettings, ScheduleConfig, ScheduleOverride, SettingsService,
};
