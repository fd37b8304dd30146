//! Built-in dispatcher commands

pub mod auto_save;
pub mod reminder;
pub mod schedule_cleanup;

pub use auto_save::AutoSaveCommand;
pub use reminder::{ReminderCommand, ReminderState};
pub use schedule_cleanup::ScheduleCleanupCommand;
