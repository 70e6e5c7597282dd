use std::sync::Arc;

use crate::error::LastFmError;
use crate::services::chat::ChatSink;
use crate::services::lastfm::RecentTrack;

/// Routes formatted messages to the notification and error channels.
///
/// Delivery failures are logged and swallowed: a broken chat webhook must not
/// stop a poll cycle or a command reply.
#[derive(Clone)]
pub struct Notifier {
    chat: Arc<dyn ChatSink>,
    notify_channel: String,
    error_channel: Option<String>,
}

impl Notifier {
    pub fn new(chat: Arc<dyn ChatSink>, notify_channel: String, error_channel: Option<String>) -> Self {
        Self {
            chat,
            notify_channel,
            error_channel,
        }
    }

    pub fn notify_channel(&self) -> &str {
        &self.notify_channel
    }

    pub async fn track_changed(&self, username: &str, track: &RecentTrack) {
        self.deliver(&self.notify_channel, &now_playing_message(username, track))
            .await;
    }

    pub async fn announce(&self, text: &str) {
        self.deliver(&self.notify_channel, text).await;
    }

    /// Sent to the error channel when one is configured, log-only otherwise.
    pub async fn alert(&self, text: &str) {
        match &self.error_channel {
            Some(channel) => self.deliver(channel, text).await,
            None => tracing::warn!("No error channel configured, alert not posted: {}", text),
        }
    }

    async fn deliver(&self, channel: &str, text: &str) {
        if let Err(e) = self.chat.send(channel, text).await {
            tracing::error!(channel, "Failed to deliver chat message: {}", e);
        }
    }
}

pub fn now_playing_message(username: &str, track: &RecentTrack) -> String {
    format!("🎧 {}: {} - {}", username, track.artist, track.name)
}

pub fn fetch_failure_message(username: &str, error: &LastFmError) -> String {
    match error {
        LastFmError::RateLimited => format!(
            "Last.fm notifier <{}> has overstepped the API rate limit. Consider reducing the timing on stream checks.",
            username
        ),
        LastFmError::UserNotFound => format!(
            "Last.fm notifier <{}> failing with statusCode [404]. Haalp!",
            username
        ),
        LastFmError::ServerError(status) => format!(
            "Last.fm notifier <{}> failing with statusCode [{}]. Haalp!",
            username, status
        ),
        LastFmError::MalformedResponse(_) => format!(
            "Last.fm notifier <{}> got a response it could not read. Haalp!",
            username
        ),
        LastFmError::Http(e) => format!(
            "Last.fm notifier <{}> could not reach Last.fm ({}). Haalp!",
            username, e
        ),
    }
}
