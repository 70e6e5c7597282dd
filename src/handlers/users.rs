use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    state::AppState,
    tasks::scrobble_poll::{run_scrobble_poll, PollSummary},
};

#[derive(Debug, Serialize)]
pub struct FollowedUserResponse {
    pub username: String,
    pub last_song_id: Option<String>,
}

pub async fn list_users(State(state): State<AppState>) -> Json<Vec<FollowedUserResponse>> {
    let users = state
        .registry
        .entries()
        .await
        .into_iter()
        .map(|u| FollowedUserResponse {
            username: u.username,
            last_song_id: u.last_song_id.map(|id| id.to_string()),
        })
        .collect();

    Json(users)
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<FollowedUserResponse>> {
    if !state.registry.contains(&username).await {
        return Err(AppError::NotFound(format!("{} is not being followed", username)));
    }

    let last_song_id = state.registry.get(&username).await.map(|id| id.to_string());
    Ok(Json(FollowedUserResponse {
        username,
        last_song_id,
    }))
}

/// Run one poll cycle now instead of waiting for the schedule.
pub async fn trigger_poll(State(state): State<AppState>) -> Json<PollSummary> {
    Json(run_scrobble_poll(state).await)
}
