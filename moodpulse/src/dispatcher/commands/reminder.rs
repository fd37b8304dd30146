//! Morning and evening reminder commands
//!
//! Fires on every tick past the day's threshold until the user records the
//! matching mood value. Repeated firing is not throttled here; showing the
//! reminders at a sensible rate is up to the consumer.

use crate::dispatcher::command::{
    CommandData, CommandKind, CommandResult, DispatcherCommand, ReminderData, ReminderKind,
    TickContext,
};
use crate::error::Result;
use crate::services::{ScheduleConfig, SettingsService};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

/// Per-day call counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderState {
    pub last_reset_date: Option<NaiveDate>,
    pub call_count: u32,
}

impl ReminderState {
    pub fn reset(&mut self, date: NaiveDate) {
        self.last_reset_date = Some(date);
        self.call_count = 0;
    }

    /// Reset when `date` is not the day the counter belongs to
    pub fn ensure_day(&mut self, date: NaiveDate) {
        if self.last_reset_date != Some(date) {
            self.reset(date);
        }
    }

    fn record_call(&mut self) -> u32 {
        self.call_count += 1;
        self.call_count
    }
}

pub struct ReminderCommand {
    kind: ReminderKind,
    settings: SettingsService,
    state: ReminderState,
}

impl ReminderCommand {
    pub fn new(kind: ReminderKind, settings: SettingsService) -> Self {
        Self {
            kind,
            settings,
            state: ReminderState::default(),
        }
    }

    pub fn morning(settings: SettingsService) -> Self {
        Self::new(ReminderKind::Morning, settings)
    }

    pub fn evening(settings: SettingsService) -> Self {
        Self::new(ReminderKind::Evening, settings)
    }

    pub fn state(&self) -> ReminderState {
        self.state
    }

    async fn schedule(&self) -> ScheduleConfig {
        match self.settings.load_schedule_config().await {
            Ok(schedule) => schedule,
            Err(e) => {
                tracing::warn!(
                    "Could not load schedule, using default {} time: {}",
                    self.kind.label(),
                    e
                );
                ScheduleConfig::default()
            }
        }
    }

    fn message(&self, call_count: u32) -> String {
        let what = match self.kind {
            ReminderKind::Morning => "how you feel starting work",
            ReminderKind::Evening => "how you feel after work",
        };
        if call_count == 1 {
            format!("Time to record {}", what)
        } else {
            format!("Reminder #{}: still waiting to record {}", call_count, what)
        }
    }
}

#[async_trait]
impl DispatcherCommand for ReminderCommand {
    fn name(&self) -> &'static str {
        match self.kind {
            ReminderKind::Morning => "morning_reminder",
            ReminderKind::Evening => "evening_reminder",
        }
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Reminder
    }

    fn reset_for_day(&mut self, date: NaiveDate) {
        self.state.reset(date);
    }

    async fn process_tick(&mut self, ctx: &TickContext) -> Result<CommandResult> {
        self.state.ensure_day(ctx.new_date);

        let scheduled_time = self.kind.threshold(&self.schedule().await, ctx.new_date);
        let elapsed = ctx.now - ctx.new_date.and_time(scheduled_time);

        if elapsed < Duration::zero() {
            return Ok(CommandResult::ok(format!(
                "{} reminder not due until {}",
                self.kind.label(),
                scheduled_time
            )));
        }

        // A record left over from another day says nothing about today.
        let already_recorded = ctx
            .current_record
            .as_ref()
            .filter(|record| record.date == ctx.new_date)
            .and_then(|record| self.kind.recorded_value(record))
            .is_some();

        if already_recorded {
            return Ok(CommandResult::ok(format!(
                "{} mood already recorded",
                self.kind.label()
            )));
        }

        let call_count = self.state.record_call();
        tracing::debug!(
            kind = self.kind.label(),
            call_count,
            elapsed_minutes = elapsed.num_minutes(),
            "Reminder due"
        );

        Ok(CommandResult::with_data(
            self.message(call_count),
            CommandData::Reminder(ReminderData {
                kind: self.kind,
                scheduled_time,
                elapsed,
                call_count,
            }),
        ))
    }
}
