//! Test utilities for Last.fm Notifier
//!
//! Provides helpers for building isolated test environments with:
//! - In-memory user stores (one per test)
//! - A chat sink that records every message instead of posting it
//! - AppState factories pointed at a mock Last.fm base URL
//! - Last.fm response body builders

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    config::Config,
    error::{AppError, Result},
    registry::UserRegistry,
    services::{ChatSink, LastFmService, Notifier},
    state::AppState,
    store::MemoryUserStore,
};

pub const TEST_NOTIFY_CHANNEL: &str = "#now-playing";
pub const TEST_ERROR_CHANNEL: &str = "#bot-spam";
pub const TEST_API_KEY: &str = "test_api_key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: String,
    pub text: String,
}

/// Chat sink that keeps messages in memory. Can be switched to fail every
/// send to exercise delivery errors.
#[derive(Default)]
pub struct RecordingChatSink {
    sent: Mutex<Vec<SentMessage>>,
    failing: bool,
}

impl RecordingChatSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().expect("chat sink lock poisoned").clone()
    }

    pub fn messages_to(&self, channel: &str) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.channel == channel)
            .map(|m| m.text)
            .collect()
    }
}

#[async_trait]
impl ChatSink for RecordingChatSink {
    async fn send(&self, channel: &str, text: &str) -> Result<()> {
        if self.failing {
            return Err(AppError::Chat("chat host unavailable".to_string()));
        }
        self.sent
            .lock()
            .expect("chat sink lock poisoned")
            .push(SentMessage {
                channel: channel.to_string(),
                text: text.to_string(),
            });
        Ok(())
    }
}

/// Everything a test needs to drive and inspect the notifier.
pub struct TestContext {
    pub state: AppState,
    pub chat: Arc<RecordingChatSink>,
    pub store: Arc<MemoryUserStore>,
}

/// Create a test configuration pointed at `lastfm_api_base`
pub fn test_config(lastfm_api_base: &str) -> Config {
    Config {
        lastfm_api_key: TEST_API_KEY.to_string(),
        lastfm_api_base: lastfm_api_base.to_string(),
        http_timeout: Duration::from_secs(5),
        notify_channel: TEST_NOTIFY_CHANNEL.to_string(),
        error_channel: Some(TEST_ERROR_CHANNEL.to_string()),
        cron_schedule: "30 * * * * *".to_string(),
        timezone: chrono_tz::America::Chicago,
        chat_webhook_url: "http://127.0.0.1:9/unused".to_string(),
        redis_url: "memory".to_string(),
    }
}

/// Create a complete test AppState with an empty store
pub async fn setup_test_app_state(lastfm_api_base: &str) -> TestContext {
    build_context(test_config(lastfm_api_base), MemoryUserStore::new(), RecordingChatSink::new()).await
}

/// Create a test AppState whose store already holds `users_json`
pub async fn setup_test_app_state_with_users(lastfm_api_base: &str, users_json: &str) -> TestContext {
    build_context(
        test_config(lastfm_api_base),
        MemoryUserStore::with_json(users_json),
        RecordingChatSink::new(),
    )
    .await
}

pub async fn build_context(
    config: Config,
    store: MemoryUserStore,
    chat: RecordingChatSink,
) -> TestContext {
    let store = Arc::new(store);
    let chat = Arc::new(chat);

    let registry = UserRegistry::load(store.clone())
        .await
        .expect("Failed to load test registry");
    let lastfm = LastFmService::from_config(&config).expect("Failed to build Last.fm client");
    let notifier = Notifier::new(
        chat.clone(),
        config.notify_channel.clone(),
        config.error_channel.clone(),
    );

    TestContext {
        state: AppState::new(config, registry, lastfm, notifier),
        chat,
        store,
    }
}

// ============================================================================
// Last.fm Response Builders
// ============================================================================

/// `user.getrecenttracks` body with a single track
pub fn recent_tracks_body(artist: &str, album: &str, name: &str) -> Value {
    json!({
        "recenttracks": {
            "track": [{
                "name": name,
                "artist": { "#text": artist },
                "album": { "#text": album },
            }],
            "@attr": { "page": "1", "total": "1" }
        }
    })
}

/// `user.getrecenttracks` body for an account with no scrobbles
pub fn empty_recent_tracks_body() -> Value {
    json!({ "recenttracks": { "track": [] } })
}
