use std::sync::Arc;
use tokio::sync::Mutex;

use crate::detector::{decide, ChangeAction, SongId};
use crate::error::{AppError, LastFmError, Result};
use crate::services::LastFmService;
use crate::store::{TrackedUser, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Added,
    AlreadyFollowed,
    NotFound,
}

/// Followed users and the last song seen for each, in follow order.
///
/// Every mutation is written through to the store before the in-memory copy
/// changes, so a failed save leaves both sides as they were. All operations
/// take the same lock, which keeps a user's get/compare/set in
/// [`record_track`](Self::record_track) from interleaving with anything else.
#[derive(Clone)]
pub struct UserRegistry {
    store: Arc<dyn UserStore>,
    users: Arc<Mutex<Vec<TrackedUser>>>,
}

impl UserRegistry {
    pub async fn load(store: Arc<dyn UserStore>) -> Result<Self> {
        let users = store.load().await?;
        Ok(Self {
            store,
            users: Arc::new(Mutex::new(users)),
        })
    }

    /// Start following `username` after confirming Last.fm knows them.
    ///
    /// Following someone already followed is a no-op that keeps their stored
    /// song. Failures other than "not found" are returned and leave the
    /// registry untouched.
    pub async fn follow(&self, lastfm: &LastFmService, username: &str) -> Result<FollowOutcome> {
        if self.contains(username).await {
            return Ok(FollowOutcome::AlreadyFollowed);
        }

        match lastfm.fetch_latest_track(username).await {
            Ok(_) => {}
            Err(LastFmError::UserNotFound) => return Ok(FollowOutcome::NotFound),
            Err(e) => return Err(e.into()),
        }

        let mut users = self.users.lock().await;
        // A concurrent follow may have won while we were verifying
        if users.iter().any(|u| u.username == username) {
            return Ok(FollowOutcome::AlreadyFollowed);
        }

        let mut next = users.clone();
        next.push(TrackedUser::new(username));
        self.store.save(&next).await?;
        *users = next;

        tracing::info!(user = username, "Now following user");
        Ok(FollowOutcome::Added)
    }

    /// Returns whether the user had been followed.
    pub async fn forget(&self, username: &str) -> Result<bool> {
        let mut users = self.users.lock().await;
        let Some(position) = users.iter().position(|u| u.username == username) else {
            return Ok(false);
        };

        let mut next = users.clone();
        next.remove(position);
        self.store.save(&next).await?;
        *users = next;

        tracing::info!(user = username, "Stopped following user");
        Ok(true)
    }

    pub async fn list(&self) -> Vec<String> {
        self.users
            .lock()
            .await
            .iter()
            .map(|u| u.username.clone())
            .collect()
    }

    pub async fn entries(&self) -> Vec<TrackedUser> {
        self.users.lock().await.clone()
    }

    pub async fn contains(&self, username: &str) -> bool {
        self.users
            .lock()
            .await
            .iter()
            .any(|u| u.username == username)
    }

    pub async fn get(&self, username: &str) -> Option<SongId> {
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.username == username)
            .and_then(|u| u.last_song_id.clone())
    }

    /// Store `song_id` for a followed user. Unknown users are refused so
    /// that only `follow` adds entries.
    pub async fn set(&self, username: &str, song_id: SongId) -> Result<()> {
        let mut users = self.users.lock().await;
        let Some(position) = users.iter().position(|u| u.username == username) else {
            return Err(AppError::NotFound(format!("{} is not being followed", username)));
        };

        let mut next = users.clone();
        next[position].last_song_id = Some(song_id);
        self.store.save(&next).await?;
        *users = next;
        Ok(())
    }

    /// Compare `current` with the stored song for `username` and store it
    /// when it is new or the first one seen.
    ///
    /// Returns `None` when the user is no longer followed; the result is
    /// dropped rather than re-adding them.
    pub async fn record_track(&self, username: &str, current: SongId) -> Result<Option<ChangeAction>> {
        let mut users = self.users.lock().await;
        let Some(position) = users.iter().position(|u| u.username == username) else {
            return Ok(None);
        };

        let action = decide(users[position].last_song_id.as_ref(), &current);
        if action != ChangeAction::NoChange {
            let mut next = users.clone();
            next[position].last_song_id = Some(current);
            self.store.save(&next).await?;
            *users = next;
        }

        Ok(Some(action))
    }
}
