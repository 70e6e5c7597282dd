use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::registry::UserRegistry;
use crate::services::{LastFmService, Notifier};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: UserRegistry,
    pub lastfm: LastFmService,
    pub notifier: Notifier,
    /// Held for the length of a poll cycle so cycles never overlap.
    pub poll_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: UserRegistry,
        lastfm: LastFmService,
        notifier: Notifier,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            lastfm,
            notifier,
            poll_lock: Arc::new(Mutex::new(())),
        }
    }
}
