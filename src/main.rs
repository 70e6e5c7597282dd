use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lastfm_notifier::{
    config::{Config, ServerConfig},
    handlers,
    registry::UserRegistry,
    services::{ChatSink, LastFmService, Notifier, WebhookChatSink},
    state::AppState,
    store::{MemoryUserStore, RedisUserStore, UserStore},
    tasks,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    init_tracing();

    tracing::info!("Starting Last.fm Notifier...");

    let server = ServerConfig::from_env()?;

    // A misconfigured notifier leaves the host up with only the health check
    let (state, _scheduler) = match activate_notifier().await {
        Ok((state, scheduler)) => (Some(state), Some(scheduler)),
        Err(e) => {
            tracing::error!(
                "LastFm-Notifier: {:#}. Last.fm Notifier will not function until this is corrected!",
                e
            );
            (None, None)
        }
    };

    let app = handlers::create_router(state);

    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port)).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lastfm_notifier=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn activate_notifier() -> Result<(AppState, JobScheduler)> {
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    if config.error_channel.is_none() {
        tracing::warn!(
            "LastFm-Notifier: LASTFM_ERROR_CHANNEL environment variable missing! Errors will only be logged."
        );
    }

    let store: Arc<dyn UserStore> = if config.uses_memory_store() {
        tracing::warn!("Using in-memory user store, followed users will not survive a restart");
        Arc::new(MemoryUserStore::new())
    } else {
        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis_conn = redis_client.get_connection_manager().await?;
        tracing::info!("Connected to Redis");
        Arc::new(RedisUserStore::new(redis_conn))
    };

    let registry = UserRegistry::load(store).await?;
    tracing::info!("Loaded {} followed users", registry.list().await.len());

    let lastfm = LastFmService::from_config(&config)?;
    let chat: Arc<dyn ChatSink> = Arc::new(WebhookChatSink::new(
        config.chat_webhook_url.clone(),
        config.http_timeout,
    )?);
    let notifier = Notifier::new(
        chat,
        config.notify_channel.clone(),
        config.error_channel.clone(),
    );

    let state = AppState::new(config, registry, lastfm, notifier);

    let scheduler = tasks::start_scheduler(state.clone()).await?;
    tracing::info!("Background task scheduler started");

    Ok((state, scheduler))
}
