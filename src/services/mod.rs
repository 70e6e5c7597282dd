pub mod chat;
pub mod lastfm;
pub mod notifier;

pub use chat::{ChatSink, WebhookChatSink};
pub use lastfm::{LastFmService, RecentTrack};
pub use notifier::Notifier;
