use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    commands::{self, Command, Invocation},
    error::Result,
    state::AppState,
};

/// Message forwarded by the chat host.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub room: String,
    pub user: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommandReplyResponse {
    pub replies: Vec<String>,
}

/// Unrecognised text gets an empty reply list so the host can ignore it.
pub async fn handle_command(
    State(state): State<AppState>,
    Json(payload): Json<CommandRequest>,
) -> Result<Json<CommandReplyResponse>> {
    let Some(command) = Command::parse(&payload.text) else {
        tracing::debug!("Ignoring unrecognised command text: {}", payload.text);
        return Ok(Json(CommandReplyResponse { replies: Vec::new() }));
    };

    tracing::info!(room = %payload.room, user = %payload.user, ?command, "Received command");

    let invocation = Invocation {
        room: payload.room,
        requester: payload.user,
    };
    let response = commands::execute(&state, command, &invocation).await?;

    Ok(Json(CommandReplyResponse {
        replies: response.replies,
    }))
}
