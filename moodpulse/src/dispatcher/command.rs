//! Dispatcher command contract and result types

use crate::database::MoodRecord;
use crate::error::Result;
use crate::services::ScheduleConfig;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// What the dispatcher does with the outgoing day's record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoSaveDecision {
    NoAction,
    SaveRecord,
    DiscardRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Morning,
    Evening,
}

impl ReminderKind {
    /// Threshold for `date`, honoring any override for that date
    pub fn threshold(self, schedule: &ScheduleConfig, date: NaiveDate) -> NaiveTime {
        match self {
            ReminderKind::Morning => schedule.morning_time_for(date),
            ReminderKind::Evening => schedule.evening_time_for(date),
        }
    }

    /// The mood value this reminder asks for
    pub fn recorded_value(self, record: &MoodRecord) -> Option<u8> {
        match self {
            ReminderKind::Morning => record.start_of_work,
            ReminderKind::Evening => record.end_of_work,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReminderKind::Morning => "morning",
            ReminderKind::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderData {
    pub kind: ReminderKind,
    pub scheduled_time: NaiveTime,
    /// Time since the threshold passed. Negative when not yet due.
    pub elapsed: Duration,
    /// Reminders fired today by this command, starting at 1
    pub call_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandData {
    Reminder(ReminderData),
    AutoSave(AutoSaveDecision),
}

/// Outcome of one command on one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    pub data: Option<CommandData>,
}

impl CommandResult {
    /// Successful result with nothing to report
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: CommandData) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn reminder(&self) -> Option<&ReminderData> {
        match &self.data {
            Some(CommandData::Reminder(data)) => Some(data),
            _ => None,
        }
    }

    pub fn auto_save_decision(&self) -> Option<AutoSaveDecision> {
        match self.data {
            Some(CommandData::AutoSave(decision)) => Some(decision),
            _ => None,
        }
    }
}

/// Which ticks a command takes part in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Every tick
    Reminder,
    /// Only ticks that cross a date boundary
    DayTransition,
}

/// Inputs shared by every command on a tick
#[derive(Debug, Clone)]
pub struct TickContext {
    /// Last observed date. Equal to `new_date` on same-day ticks.
    pub old_date: NaiveDate,
    pub new_date: NaiveDate,
    pub now: NaiveDateTime,
    pub current_record: Option<MoodRecord>,
}

impl TickContext {
    pub fn is_day_transition(&self) -> bool {
        self.old_date != self.new_date
    }
}

/// One unit of per-tick logic.
///
/// Anticipated "nothing to do" cases must come back as `Ok` results without
/// data. An `Err` or a panic is turned into a failed result by the
/// dispatcher and does not stop the rest of the pipeline.
#[async_trait]
pub trait DispatcherCommand: Send {
    fn name(&self) -> &'static str;

    fn kind(&self) -> CommandKind;

    /// Clear per-day state. Called by the dispatcher on each date change.
    fn reset_for_day(&mut self, _date: NaiveDate) {}

    async fn process_tick(&mut self, ctx: &TickContext) -> Result<CommandResult>;
}
