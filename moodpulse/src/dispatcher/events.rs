//! Dispatcher events
//!
//! Subscribers are plain callbacks invoked synchronously, in registration
//! order, on the dispatcher's task. Consumers that need another execution
//! context must hand the event off themselves.

use super::command::{AutoSaveDecision, ReminderData, ReminderKind};
use crate::database::MoodRecord;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateChangedEvent {
    pub old_date: NaiveDate,
    pub new_date: NaiveDate,
    pub decision: AutoSaveDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoSaveEvent {
    pub record: MoodRecord,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderEvent {
    pub kind: ReminderKind,
    pub scheduled_time: NaiveTime,
    pub elapsed_seconds: i64,
    pub call_count: u32,
    pub message: String,
}

impl ReminderEvent {
    pub fn new(data: &ReminderData, message: impl Into<String>) -> Self {
        Self {
            kind: data.kind,
            scheduled_time: data.scheduled_time,
            elapsed_seconds: data.elapsed.num_seconds(),
            call_count: data.call_count,
            message: message.into(),
        }
    }
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Callback list for one event type
pub struct Subscribers<E> {
    name: &'static str,
    handlers: RwLock<Vec<Handler<E>>>,
}

impl<E> Subscribers<E> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(handler));
    }

    /// Deliver `event` to every subscriber registered when publishing began.
    /// A panicking subscriber is logged and skipped. The lock is released
    /// before any callback runs, so callbacks may subscribe or dispose.
    pub fn publish(&self, event: &E) {
        let handlers: Vec<Handler<E>> = self
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for (index, handler) in handlers.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::error!(
                    event = self.name,
                    subscriber = index,
                    "Event subscriber panicked"
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn clear(&self) {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

/// All subscription points exposed by the dispatcher
pub struct DispatcherEvents {
    pub date_changed: Subscribers<DateChangedEvent>,
    pub auto_save_occurred: Subscribers<AutoSaveEvent>,
    pub morning_reminder: Subscribers<ReminderEvent>,
    pub evening_reminder: Subscribers<ReminderEvent>,
}

impl Default for DispatcherEvents {
    fn default() -> Self {
        Self {
            date_changed: Subscribers::new("date_changed"),
            auto_save_occurred: Subscribers::new("auto_save_occurred"),
            morning_reminder: Subscribers::new("morning_reminder"),
            evening_reminder: Subscribers::new("evening_reminder"),
        }
    }
}

impl DispatcherEvents {
    pub(crate) fn publish_reminder(&self, event: &ReminderEvent) {
        match event.kind {
            ReminderKind::Morning => self.morning_reminder.publish(event),
            ReminderKind::Evening => self.evening_reminder.publish(event),
        }
    }

    pub(crate) fn clear(&self) {
        self.date_changed.clear();
        self.auto_save_occurred.clear();
        self.morning_reminder.clear();
        self.evening_reminder.clear();
    }
}
