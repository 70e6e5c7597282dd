use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::state::AppState;

pub mod scrobble_poll;

/// Start the cron scheduler. The returned handle must be kept alive for the
/// jobs to keep firing.
pub async fn start_scheduler(state: AppState) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let schedule = state.config.cron_schedule.clone();
    let timezone = state.config.timezone;

    let poll_job = Job::new_async_tz(schedule.as_str(), timezone, move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            scrobble_poll::run_scheduled_poll(state).await;
        })
    })?;
    scheduler.add(poll_job).await?;

    scheduler.start().await?;
    tracing::info!(schedule = %schedule, timezone = %timezone, "Scrobble poll scheduled");

    Ok(scheduler)
}
