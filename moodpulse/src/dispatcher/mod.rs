//! Tick-driven command dispatcher
//!
//! A polling scheduler that samples the date, detects day boundaries and
//! drives the auto-save, reminder and schedule cleanup commands.

pub mod clock;
pub mod command;
pub mod commands;
pub mod events;
pub mod tick;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{
    AutoSaveDecision, CommandData, CommandKind, CommandResult, DispatcherCommand, ReminderData,
    ReminderKind, TickContext,
};
pub use events::{AutoSaveEvent, DateChangedEvent, DispatcherEvents, ReminderEvent};
pub use tick::{default_commands, CommandOutcome, TickDispatcher, TickOutcome};
