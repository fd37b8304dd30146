//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::DATABASE_FILE_NAME;
use crate::database::{open_mood_store, Repository};
use crate::dispatcher::{Clock, TickDispatcher};
use crate::error::Result;
use crate::services::{MoodsService, SettingsService};
use std::path::PathBuf;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub settings: SettingsService,
    pub moods: MoodsService,
    pub dispatcher: Arc<TickDispatcher>,
}

/// Application setup - called once on startup. The dispatcher is built but not started.
pub async fn setup(app_data_dir: PathBuf, clock: Arc<dyn Clock>) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    tokio::fs::create_dir_all(&app_data_dir).await?;

    let settings = SettingsService::new(app_data_dir.clone());
    let app_settings = settings.load().await?;

    let pool = open_mood_store(&app_data_dir.join(DATABASE_FILE_NAME)).await?;
    let moods = MoodsService::load(
        Repository::new(pool),
        app_settings.dispatcher.missing_mood_policy,
    )
    .await?;

    let dispatcher = Arc::new(TickDispatcher::new(
        clock,
        moods.clone(),
        settings.clone(),
        app_settings.dispatcher.tick_interval(),
    ));

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        app_data_dir,
        settings,
        moods,
        dispatcher,
    })
}
