//! Tick dispatcher
//!
//! Polls the clock on a fixed interval, tells same-day ticks apart from
//! day-transition ticks and runs the matching command subset in a fixed order.
//! Runs one background loop in the style of the reminders scheduler: errors and
//! panics are logged and the loop keeps going.

use super::clock::Clock;
use super::command::{
    AutoSaveDecision, CommandKind, CommandResult, DispatcherCommand, ReminderKind, TickContext,
};
use super::commands::{AutoSaveCommand, ReminderCommand, ScheduleCleanupCommand};
use super::events::{AutoSaveEvent, DateChangedEvent, DispatcherEvents, ReminderEvent};
use crate::database::MoodRecord;
use crate::error::{AppError, Result};
use crate::services::{MoodsService, SettingsService};
use chrono::{NaiveDate, NaiveDateTime};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// The pipeline run on day-transition ticks, in order
pub fn default_commands(settings: SettingsService) -> Vec<Box<dyn DispatcherCommand>> {
    vec![
        Box::new(AutoSaveCommand::new()),
        Box::new(ReminderCommand::morning(settings.clone())),
        Box::new(ReminderCommand::evening(settings.clone())),
        Box::new(ScheduleCleanupCommand::new(settings)),
    ]
}

/// One command's result on one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: &'static str,
    pub result: CommandResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    SameDay {
        date: NaiveDate,
        outcomes: Vec<CommandOutcome>,
    },
    DayTransition {
        old_date: NaiveDate,
        new_date: NaiveDate,
        decision: AutoSaveDecision,
        outcomes: Vec<CommandOutcome>,
    },
    /// A previous tick was still being processed
    Skipped,
    /// The timer was stopped or the dispatcher disposed
    Stopped,
}

impl TickOutcome {
    pub fn outcomes(&self) -> &[CommandOutcome] {
        match self {
            TickOutcome::SameDay { outcomes, .. } | TickOutcome::DayTransition { outcomes, .. } => {
                outcomes
            }
            TickOutcome::Skipped | TickOutcome::Stopped => &[],
        }
    }

    /// Names of the commands that ran, in order
    pub fn commands_run(&self) -> Vec<&'static str> {
        self.outcomes().iter().map(|o| o.command).collect()
    }
}

struct DispatcherState {
    last_observed_date: Option<NaiveDate>,
    commands: Vec<Box<dyn DispatcherCommand>>,
}

struct DispatcherInner {
    clock: Arc<dyn Clock>,
    moods: MoodsService,
    state: Mutex<DispatcherState>,
    current_record: RwLock<Option<MoodRecord>>,
    events: DispatcherEvents,
    running: AtomicBool,
    disposed: AtomicBool,
}

struct TimerHandle {
    stop_tx: watch::Sender<bool>,
    // Detached on stop so an in-flight tick can finish
    _task: JoinHandle<()>,
}

pub struct TickDispatcher {
    inner: Arc<DispatcherInner>,
    tick_interval: Duration,
    timer: std::sync::Mutex<Option<TimerHandle>>,
}

impl TickDispatcher {
    /// Dispatcher running the built-in command pipeline
    pub fn new(
        clock: Arc<dyn Clock>,
        moods: MoodsService,
        settings: SettingsService,
        tick_interval: Duration,
    ) -> Self {
        Self::with_commands(clock, moods, default_commands(settings), tick_interval)
    }

    /// Dispatcher running `commands` in the given order
    pub fn with_commands(
        clock: Arc<dyn Clock>,
        moods: MoodsService,
        commands: Vec<Box<dyn DispatcherCommand>>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                clock,
                moods,
                state: Mutex::new(DispatcherState {
                    last_observed_date: None,
                    commands,
                }),
                current_record: RwLock::new(None),
                events: DispatcherEvents::default(),
                running: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }),
            tick_interval,
            timer: std::sync::Mutex::new(None),
        }
    }

    /// Start ticking. Does nothing if already running.
    pub fn start(&self) -> Result<()> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(AppError::Disposed);
        }

        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if timer.is_some() {
            return Ok(());
        }

        self.inner.running.store(true, Ordering::SeqCst);
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_timer(
            Arc::clone(&self.inner),
            self.tick_interval,
            stop_rx,
        ));
        *timer = Some(TimerHandle {
            stop_tx,
            _task: task,
        });

        tracing::info!(
            "Tick dispatcher started ({}s interval)",
            self.tick_interval.as_secs_f64()
        );
        Ok(())
    }

    /// Stop future ticks. A tick already being processed runs to completion.
    pub fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);

        let handle = self
            .timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.stop_tx.send(true);
            tracing::info!("Tick dispatcher stopped");
        }
    }

    /// Stop permanently and drop all subscribers. Safe to call repeatedly,
    /// including from inside an event subscriber.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop();
        self.inner.events.clear();
        tracing::info!("Tick dispatcher disposed");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Replace the record the user is editing for today
    pub async fn set_current_record(&self, record: Option<MoodRecord>) {
        *self.inner.current_record.write().await = record;
    }

    pub async fn current_record(&self) -> Option<MoodRecord> {
        self.inner.current_record.read().await.clone()
    }

    /// Date seen by the most recent tick
    pub async fn last_observed_date(&self) -> Option<NaiveDate> {
        self.inner.state.lock().await.last_observed_date
    }

    /// Run one tick now, independent of the timer. Dropped if a tick is in progress.
    pub async fn tick_now(&self) -> Result<TickOutcome> {
        self.inner.tick(false).await
    }

    pub fn events(&self) -> &DispatcherEvents {
        &self.inner.events
    }

    pub fn on_date_changed<F>(&self, handler: F)
    where
        F: Fn(&DateChangedEvent) + Send + Sync + 'static,
    {
        self.inner.events.date_changed.subscribe(handler);
    }

    pub fn on_auto_save_occurred<F>(&self, handler: F)
    where
        F: Fn(&AutoSaveEvent) + Send + Sync + 'static,
    {
        self.inner.events.auto_save_occurred.subscribe(handler);
    }

    pub fn on_morning_reminder<F>(&self, handler: F)
    where
        F: Fn(&ReminderEvent) + Send + Sync + 'static,
    {
        self.inner.events.morning_reminder.subscribe(handler);
    }

    pub fn on_evening_reminder<F>(&self, handler: F)
    where
        F: Fn(&ReminderEvent) + Send + Sync + 'static,
    {
        self.inner.events.evening_reminder.subscribe(handler);
    }
}

impl Drop for TickDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(
    inner: Arc<DispatcherInner>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = interval.tick() => {}
        }

        // Outside the select so stopping never cancels a tick midway
        match AssertUnwindSafe(inner.tick(true)).catch_unwind().await {
            Ok(Ok(TickOutcome::Skipped)) => {
                tracing::debug!("Previous tick still running, dropped this one");
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!("Dispatcher tick failed: {}", e),
            Err(panic) => tracing::error!("Dispatcher tick panicked: {}", panic_message(&*panic)),
        }
    }

    tracing::debug!("Dispatcher timer loop exited");
}

impl DispatcherInner {
    async fn tick(&self, from_timer: bool) -> Result<TickOutcome> {
        if self.disposed.load(Ordering::SeqCst)
            || (from_timer && !self.running.load(Ordering::SeqCst))
        {
            return Ok(TickOutcome::Stopped);
        }

        let Ok(mut state) = self.state.try_lock() else {
            return Ok(TickOutcome::Skipped);
        };

        let now = self.clock.now();
        let current_date = now.date();
        let record = self.current_record.read().await.clone();

        let last_observed_date = state.last_observed_date;
        match last_observed_date {
            Some(old_date) if old_date != current_date => {
                self.day_transition(&mut state, old_date, now, record).await
            }
            _ => {
                state.last_observed_date = Some(current_date);
                self.same_day(&mut state, now, record).await
            }
        }
    }

    async fn same_day(
        &self,
        state: &mut DispatcherState,
        now: NaiveDateTime,
        record: Option<MoodRecord>,
    ) -> Result<TickOutcome> {
        let date = now.date();
        let ctx = TickContext {
            old_date: date,
            new_date: date,
            now,
            current_record: record,
        };

        let outcomes = run_commands(&mut state.commands, &ctx).await;
        self.publish_reminders(&outcomes);

        Ok(TickOutcome::SameDay { date, outcomes })
    }

    async fn day_transition(
        &self,
        state: &mut DispatcherState,
        old_date: NaiveDate,
        now: NaiveDateTime,
        record: Option<MoodRecord>,
    ) -> Result<TickOutcome> {
        let new_date = now.date();
        tracing::info!("Date changed from {} to {}", old_date, new_date);

        // Before running anything so today's first reminder counts as #1
        for command in state.commands.iter_mut() {
            command.reset_for_day(new_date);
        }

        let ctx = TickContext {
            old_date,
            new_date,
            now,
            current_record: record.clone(),
        };
        let outcomes = run_commands(&mut state.commands, &ctx).await;

        let decision = outcomes
            .iter()
            .find_map(|o| o.result.auto_save_decision())
            .unwrap_or(AutoSaveDecision::NoAction);

        let saved = match (decision, record) {
            (AutoSaveDecision::SaveRecord, Some(record)) => {
                match self.moods.add_or_update(record, true).await {
                    Ok(saved) => saved,
                    Err(e) => {
                        tracing::error!("Auto-save for {} failed: {}", old_date, e);
                        None
                    }
                }
            }
            _ => None,
        };

        self.events.date_changed.publish(&DateChangedEvent {
            old_date,
            new_date,
            decision,
        });
        if let Some(record) = saved {
            self.events.auto_save_occurred.publish(&AutoSaveEvent {
                record,
                date: old_date,
            });
        }
        self.publish_reminders(&outcomes);

        state.last_observed_date = Some(new_date);
        self.roll_current_record(new_date).await;

        Ok(TickOutcome::DayTransition {
            old_date,
            new_date,
            decision,
            outcomes,
        })
    }

    /// Swap a record left over from an earlier day for today's stored entry
    async fn roll_current_record(&self, new_date: NaiveDate) {
        let todays_entry = self.moods.get_entry(new_date).await;
        let mut current = self.current_record.write().await;
        if current.as_ref().map_or(true, |r| r.date != new_date) {
            *current = todays_entry;
        }
    }

    fn publish_reminders(&self, outcomes: &[CommandOutcome]) {
        for outcome in outcomes {
            if let Some(data) = outcome.result.reminder() {
                let event = ReminderEvent::new(data, outcome.result.message.clone());
                match data.kind {
                    ReminderKind::Morning => tracing::info!(
                        call_count = data.call_count,
                        "Morning reminder: {}",
                        event.message
                    ),
                    ReminderKind::Evening => tracing::info!(
                        call_count = data.call_count,
                        "Evening reminder: {}",
                        event.message
                    ),
                }
                self.events.publish_reminder(&event);
            }
        }
    }
}

/// Run the commands that take part in this tick, in order. A failing or
/// panicking command becomes a failed result and the rest still run.
async fn run_commands(
    commands: &mut [Box<dyn DispatcherCommand>],
    ctx: &TickContext,
) -> Vec<CommandOutcome> {
    let day_transition = ctx.is_day_transition();
    let mut outcomes = Vec::with_capacity(commands.len());

    for command in commands.iter_mut() {
        if !day_transition && command.kind() != CommandKind::Reminder {
            continue;
        }

        let name = command.name();
        let result = match AssertUnwindSafe(command.process_tick(ctx))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::error!(command = name, "Command failed: {}", e);
                CommandResult::failure(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                tracing::error!(command = name, "Command panicked: {}", message);
                CommandResult::failure(format!("panicked: {}", message))
            }
        };

        outcomes.push(CommandOutcome {
            command: name,
            result,
        });
    }

    outcomes
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
