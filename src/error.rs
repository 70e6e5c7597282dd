use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Outcome of a failed `user.getrecenttracks` call.
#[derive(Error, Debug)]
pub enum LastFmError {
    #[error("user not found on Last.fm")]
    UserNotFound,

    #[error("Last.fm rate limit exceeded")]
    RateLimited,

    #[error("Last.fm responded with status {0}")]
    ServerError(u16),

    #[error("malformed Last.fm response: {0}")]
    MalformedResponse(String),

    #[error("Last.fm request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Last.fm error: {0}")]
    LastFm(#[from] LastFmError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0} environment variable missing")]
    ConfigMissing(&'static str),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Chat delivery failed: {0}")]
    Chat(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error occurred")
            }
            Self::HttpRequest(ref e) => {
                tracing::error!("HTTP request error: {}", e);
                (StatusCode::BAD_GATEWAY, "External service request failed")
            }
            Self::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Data processing error")
            }
            Self::LastFm(ref e) => {
                tracing::warn!("Last.fm error: {}", e);
                (StatusCode::BAD_GATEWAY, "Last.fm request failed")
            }
            Self::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            Self::ConfigMissing(_) | Self::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Notifier is misconfigured")
            }
            Self::Chat(ref msg) => {
                tracing::error!("Chat delivery error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.as_str())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
