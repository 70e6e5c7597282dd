use governor::{clock::DefaultClock, state::direct::NotKeyed, state::InMemoryState, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::detector::SongId;
use crate::error::{LastFmError, Result};

pub const UNKNOWN_ARTIST: &str = "<Unknown Artist>";
pub const UNKNOWN_ALBUM: &str = "<Unknown Album>";
pub const UNTITLED_TRACK: &str = "<Untitled Track>";

#[derive(Clone)]
pub struct LastFmService {
    client: Client,
    api_base: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

/// Most recent scrobble for a user, with placeholders for missing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTrack {
    pub artist: String,
    pub album: String,
    pub name: String,
    pub now_playing: bool,
}

impl RecentTrack {
    pub fn song_id(&self) -> SongId {
        SongId::new(&self.artist, &self.album, &self.name)
    }
}

#[derive(Debug, Deserialize)]
struct RecentTracksEnvelope {
    recenttracks: RecentTracks,
}

#[derive(Debug, Deserialize)]
struct RecentTracks {
    track: OneOrMany<RawTrack>,
}

/// Last.fm collapses single-element lists into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    name: Option<String>,
    artist: Option<TextField>,
    album: Option<TextField>,
    #[serde(rename = "@attr")]
    attr: Option<TrackAttr>,
}

#[derive(Debug, Deserialize)]
struct TextField {
    #[serde(rename = "#text")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackAttr {
    nowplaying: Option<String>,
}

impl From<RawTrack> for RecentTrack {
    fn from(raw: RawTrack) -> Self {
        Self {
            artist: raw
                .artist
                .and_then(|a| a.text)
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album: raw
                .album
                .and_then(|a| a.text)
                .unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            name: raw.name.unwrap_or_else(|| UNTITLED_TRACK.to_string()),
            now_playing: raw
                .attr
                .and_then(|attr| attr.nowplaying)
                .is_some_and(|flag| flag.eq_ignore_ascii_case("true")),
        }
    }
}

impl LastFmService {
    pub fn new(api_base: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        // Last.fm allows five requests per second per key
        let quota = Quota::per_second(nonzero!(5u32));

        Ok(Self {
            client,
            api_base,
            api_key,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.lastfm_api_base.clone(),
            config.lastfm_api_key.clone(),
            config.http_timeout,
        )
    }

    /// Fetch the most recent scrobble for `username`.
    ///
    /// Returns `Ok(None)` when the user exists but has nothing in their
    /// recent-tracks list. Exactly one request is made; retrying is left to
    /// the next poll.
    pub async fn fetch_latest_track(
        &self,
        username: &str,
    ) -> std::result::Result<Option<RecentTrack>, LastFmError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("method", "user.getrecenttracks"),
                ("user", username),
            ])
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Err(LastFmError::UserNotFound),
            StatusCode::TOO_MANY_REQUESTS => return Err(LastFmError::RateLimited),
            s if s.as_u16() >= 400 => return Err(LastFmError::ServerError(s.as_u16())),
            _ => {}
        }

        tracing::debug!(user = username, "Retrieved data from Last.fm API");
        let body = response.text().await?;
        parse_recent_tracks(&body)
    }
}

pub fn parse_recent_tracks(body: &str) -> std::result::Result<Option<RecentTrack>, LastFmError> {
    let envelope: RecentTracksEnvelope = serde_json::from_str(body)
        .map_err(|e| LastFmError::MalformedResponse(e.to_string()))?;

    let first = match envelope.recenttracks.track {
        OneOrMany::Many(tracks) => tracks.into_iter().next(),
        OneOrMany::One(track) => Some(track),
    };

    Ok(first.map(RecentTrack::from))
}
