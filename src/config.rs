use chrono_tz::Tz;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tokio_cron_scheduler::Job;

use crate::error::{AppError, Result};

pub const DEFAULT_CRON_SCHEDULE: &str = "30 * * * * *";
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";
pub const DEFAULT_LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Selects the in-process user store instead of Redis.
pub const MEMORY_STORE_URL: &str = "memory";

/// Settings for the notifier itself. Loading fails when a required variable
/// is missing, which keeps the notifier switched off.
#[derive(Debug, Clone)]
pub struct Config {
    pub lastfm_api_key: String,
    pub lastfm_api_base: String,
    pub http_timeout: Duration,
    pub notify_channel: String,
    pub error_channel: Option<String>,
    pub cron_schedule: String,
    pub timezone: Tz,
    pub chat_webhook_url: String,
    pub redis_url: String,
}

/// Where the HTTP surface listens. Always loadable, so the host can come up
/// even when the notifier cannot.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(AppError::ConfigMissing(key));

        let lastfm_api_key = required("LASTFM_API_KEY")?;
        let notify_channel = required("LASTFM_NOTIFY_CHANNEL")?;
        let chat_webhook_url = required("CHAT_WEBHOOK_URL")?;

        let timezone_name = var("TZ").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = Tz::from_str(&timezone_name).map_err(|_| {
            AppError::Configuration(format!(
                "Invalid TZ: {} (expected IANA tz like America/Chicago)",
                timezone_name
            ))
        })?;

        let cron_schedule =
            var("LASTFM_CRON_SCHEDULE").unwrap_or_else(|| DEFAULT_CRON_SCHEDULE.to_string());
        validate_cron_schedule(&cron_schedule, timezone)?;

        let http_timeout = match var("LASTFM_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Configuration(format!(
                    "Invalid LASTFM_HTTP_TIMEOUT_SECS: {} (expected whole seconds)",
                    raw
                ))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            lastfm_api_key,
            lastfm_api_base: var("LASTFM_API_BASE")
                .unwrap_or_else(|| DEFAULT_LASTFM_API_BASE.to_string()),
            http_timeout: Duration::from_secs(http_timeout),
            notify_channel,
            error_channel: var("LASTFM_ERROR_CHANNEL"),
            cron_schedule,
            timezone,
            chat_webhook_url,
            redis_url: var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.redis_url.eq_ignore_ascii_case(MEMORY_STORE_URL)
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("SERVER_PORT").unwrap_or_else(|| "3000".to_string());

        Ok(Self {
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: port.parse().map_err(|_| {
                AppError::Configuration(format!("SERVER_PORT must be a valid port number, got {}", port))
            })?,
        })
    }
}

/// Builds a throwaway job so a bad expression fails at startup instead of
/// when the scheduler is created.
fn validate_cron_schedule(schedule: &str, timezone: Tz) -> Result<()> {
    Job::new_async_tz(schedule, timezone, |_uuid, _lock| Box::pin(async {}))
        .map(|_| ())
        .map_err(|e| {
            AppError::Configuration(format!(
                "Invalid LASTFM_CRON_SCHEDULE: {} ({}; expected six fields like \"30 * * * * *\")",
                schedule, e
            ))
        })
}
