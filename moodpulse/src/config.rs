//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Mood Values =====

/// Lowest mood a user can record
pub const MIN_MOOD: u8 = 1;
/// Highest mood a user can record
pub const MAX_MOOD: u8 = 10;

// ===== Dispatcher Timing =====

/// Default interval between dispatcher ticks in seconds
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 30;

/// Minimum tick interval in seconds.
/// Faster polling adds nothing; reminders are minute-granular.
pub const MIN_TICK_INTERVAL_SECS: u64 = 1;

/// Maximum tick interval in seconds (15 minutes).
/// Slower polling makes reminders and auto-save visibly late.
pub const MAX_TICK_INTERVAL_SECS: u64 = 900;

// ===== Reminder Schedule Defaults =====

/// Default morning reminder threshold (hour, minute)
pub const DEFAULT_MORNING_TIME: (u32, u32) = (9, 0);

/// Default evening reminder threshold (hour, minute)
pub const DEFAULT_EVENING_TIME: (u32, u32) = (18, 0);

// ===== Storage =====

/// Settings file name inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// SQLite database file name inside the data directory
pub const DATABASE_FILE_NAME: &str = "moodpulse.db";

/// How long a connection waits on a locked database before failing
pub const DB_BUSY_TIMEOUT_SECS: u64 = 5;

/// Connections in the mood store pool. Writes are rare: one per save.
pub const DB_MAX_CONNECTIONS: u32 = 2;

/// Environment variable selecting the data directory for the daemon
pub const DATA_DIR_ENV: &str = "MOODPULSE_DATA_DIR";

/// Data directory used when the environment variable is not set
pub const DEFAULT_DATA_DIR: &str = "moodpulse-data";
