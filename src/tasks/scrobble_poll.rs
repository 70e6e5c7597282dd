use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    detector::ChangeAction,
    error::LastFmError,
    services::notifier::fetch_failure_message,
    state::AppState,
};

/// Tally of one poll cycle.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PollSummary {
    pub started_at: DateTime<Utc>,
    pub checked: usize,
    pub seeded: usize,
    pub notified: usize,
    pub unchanged: usize,
    pub idle: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserCheck {
    Seeded,
    Notified,
    Unchanged,
    /// No recent track on the account.
    Idle,
    /// Forgotten while the fetch was in flight.
    Skipped,
    Failed,
}

impl PollSummary {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            checked: 0,
            seeded: 0,
            notified: 0,
            unchanged: 0,
            idle: 0,
            skipped: 0,
            failed: 0,
        }
    }

    fn record(&mut self, check: UserCheck) {
        self.checked += 1;
        match check {
            UserCheck::Seeded => self.seeded += 1,
            UserCheck::Notified => self.notified += 1,
            UserCheck::Unchanged => self.unchanged += 1,
            UserCheck::Idle => self.idle += 1,
            UserCheck::Skipped => self.skipped += 1,
            UserCheck::Failed => self.failed += 1,
        }
    }
}

/// Check every followed user once, waiting for any cycle already running.
/// A failure for one user is reported and the cycle moves on to the next.
pub async fn run_scrobble_poll(state: AppState) -> PollSummary {
    let _guard = state.poll_lock.lock().await;
    poll_all_users(&state).await
}

/// Cron entry point. Skips the fire when the previous cycle is still running.
pub async fn run_scheduled_poll(state: AppState) -> Option<PollSummary> {
    let Ok(_guard) = state.poll_lock.try_lock() else {
        tracing::info!("Previous scrobble poll still running, skipping this fire");
        return None;
    };
    Some(poll_all_users(&state).await)
}

async fn poll_all_users(state: &AppState) -> PollSummary {
    tracing::info!("Checking for new Last.fm scrobbles");

    let usernames = state.registry.list().await;
    let mut summary = PollSummary::new();

    for username in usernames {
        let check = check_user(state, &username).await;
        summary.record(check);
    }

    tracing::info!(
        checked = summary.checked,
        notified = summary.notified,
        failed = summary.failed,
        "Scrobble poll completed"
    );
    summary
}

async fn check_user(state: &AppState, username: &str) -> UserCheck {
    let track = match state.lastfm.fetch_latest_track(username).await {
        Ok(Some(track)) => track,
        Ok(None) => {
            tracing::info!(user = username, "Nobody is scrobbling right now");
            return UserCheck::Idle;
        }
        Err(e) => {
            match e {
                LastFmError::RateLimited => {
                    tracing::warn!(user = username, "Overstepped the Last.fm API rate limit")
                }
                _ => tracing::error!(user = username, "Last.fm check failed: {}", e),
            }
            state.notifier.alert(&fetch_failure_message(username, &e)).await;
            return UserCheck::Failed;
        }
    };

    let song_id = track.song_id();
    match state.registry.record_track(username, song_id.clone()).await {
        Ok(Some(ChangeAction::Seed)) => {
            tracing::info!(
                user = username,
                song = %song_id,
                "No previous song for user, saving this one without announcing"
            );
            UserCheck::Seeded
        }
        Ok(Some(ChangeAction::NoChange)) => {
            tracing::info!(user = username, song = %song_id, "No change since last check");
            UserCheck::Unchanged
        }
        Ok(Some(ChangeAction::Notify)) => {
            tracing::info!(
                user = username,
                song = %song_id,
                now_playing = track.now_playing,
                "New song found"
            );
            state.notifier.track_changed(username, &track).await;
            UserCheck::Notified
        }
        Ok(None) => {
            tracing::debug!(user = username, "User was forgotten during the check");
            UserCheck::Skipped
        }
        Err(e) => {
            tracing::error!(user = username, "Failed to store latest song: {}", e);
            UserCheck::Failed
        }
    }
}
