// MoodPulse - mood tracker background daemon
// Entry point and application setup

use moodpulse::config::{DATA_DIR_ENV, DEFAULT_DATA_DIR};
use moodpulse::dispatcher::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn log_event<E: serde::Serialize>(name: &str, event: &E) {
    match serde_json::to_string(event) {
        Ok(json) => tracing::info!(event = name, "{}", json),
        Err(e) => tracing::warn!(event = name, "Failed to serialize event: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodpulse=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MoodPulse");

    let data_dir = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let state = moodpulse::app::setup(data_dir, Arc::new(SystemClock)).await?;
    let dispatcher = &state.dispatcher;

    dispatcher.on_date_changed(|e| log_event("date_changed", e));
    dispatcher.on_auto_save_occurred(|e| log_event("auto_save_occurred", e));
    dispatcher.on_morning_reminder(|e| log_event("morning_reminder", e));
    dispatcher.on_evening_reminder(|e| log_event("evening_reminder", e));

    let today = chrono::Local::now().date_naive();
    dispatcher
        .set_current_record(state.moods.get_entry(today).await)
        .await;
    dispatcher.start()?;

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");
    dispatcher.dispose();

    Ok(())
}
