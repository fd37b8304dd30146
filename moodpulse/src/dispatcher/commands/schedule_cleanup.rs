//! Schedule cleanup command
//!
//! Drops schedule overrides for dates that have passed, once per date change.

use crate::dispatcher::command::{CommandKind, CommandResult, DispatcherCommand, TickContext};
use crate::error::Result;
use crate::services::SettingsService;
use async_trait::async_trait;

pub struct ScheduleCleanupCommand {
    settings: SettingsService,
}

impl ScheduleCleanupCommand {
    pub fn new(settings: SettingsService) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DispatcherCommand for ScheduleCleanupCommand {
    fn name(&self) -> &'static str {
        "schedule_cleanup"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::DayTransition
    }

    async fn process_tick(&mut self, ctx: &TickContext) -> Result<CommandResult> {
        let removed = self.settings.cleanup_expired_overrides(ctx.new_date).await?;

        Ok(CommandResult::ok(format!(
            "Removed {} expired schedule override(s)",
            removed
        )))
    }
}
