//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{ArenaEngine, EngineHandle, EngineSettings};
use crate::notify::{BotClient, Notifier};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: EngineHandle,
}

impl AppState {
    /// Start the notification worker and the arena engine.
    /// Must be called from within a Tokio runtime.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Initialize bot notifications (disabled without a token)
        let notifier = Notifier::spawn(BotClient::from_config(&config));

        // Initialize the arena engine
        let engine = ArenaEngine::spawn(
            EngineSettings {
                width: config.arena_width,
                height: config.arena_height,
                seed: config.arena_seed,
            },
            notifier,
        );

        Self { config, engine }
    }
}
