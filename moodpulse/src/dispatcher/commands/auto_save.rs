//! Auto-save command
//!
//! Decides what happens to the outgoing day's record when the date rolls over.
//! The dispatcher applies the decision; this command never writes.

use crate::dispatcher::command::{
    AutoSaveDecision, CommandData, CommandKind, CommandResult, DispatcherCommand, TickContext,
};
use crate::error::Result;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct AutoSaveCommand;

impl AutoSaveCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DispatcherCommand for AutoSaveCommand {
    fn name(&self) -> &'static str {
        "auto_save"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::DayTransition
    }

    async fn process_tick(&mut self, ctx: &TickContext) -> Result<CommandResult> {
        let (decision, message) = match &ctx.current_record {
            None => (AutoSaveDecision::NoAction, "No record to save".to_string()),
            Some(record) if record.date != ctx.old_date => (
                AutoSaveDecision::NoAction,
                format!(
                    "Record for {} does not belong to the outgoing day {}",
                    record.date, ctx.old_date
                ),
            ),
            Some(record) if !record.should_persist() => (
                AutoSaveDecision::NoAction,
                format!("Record for {} is empty", record.date),
            ),
            Some(record) => match record.validate() {
                Ok(()) => (
                    AutoSaveDecision::SaveRecord,
                    format!("Auto-saving record for {}", record.date),
                ),
                Err(e) => {
                    tracing::warn!("Discarding record for {}: {}", record.date, e);
                    (
                        AutoSaveDecision::DiscardRecord,
                        format!("Discarding record for {}: {}", record.date, e),
                    )
                }
            },
        };

        Ok(CommandResult::with_data(
            message,
            CommandData::AutoSave(decision),
        ))
    }
}
