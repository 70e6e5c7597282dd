pub mod commands;
pub mod health;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router. Without state only the health check is served.
pub fn create_router(state: Option<AppState>) -> Router {
    let router = match state {
        Some(state) => Router::new()
            .route("/health", get(health::health_check))
            .nest("/api", api_routes())
            .with_state(state),
        None => Router::new().route("/health", get(health::disabled_health_check)),
    };

    router.layer(TraceLayer::new_for_http())
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Chat host webhook
        .route("/commands", post(commands::handle_command))

        // Followed users
        .route("/users", get(users::list_users))
        .route("/users/:username", get(users::get_user))

        // Manual poll trigger
        .route("/poll", post(users::trigger_poll))
}
