// Background worker: drop records past their TTL every purge_interval_secs, and reclaim
// the freed pages with VACUUM on a cron schedule or a fixed interval.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::config::RetentionConfig;
use crate::record_repo::RecordRepo;
use tracing::{debug, info, instrument, warn};

/// Spawns the retention worker. Returns a join handle.
pub fn spawn(repo: Arc<RecordRepo>, config: RetentionConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, config).await;
    })
}

#[instrument(skip(repo), fields(interval_secs = config.purge_interval_secs))]
async fn run(repo: Arc<RecordRepo>, config: RetentionConfig) {
    let mut purge_tick = tokio::time::interval(Duration::from_secs(config.purge_interval_secs));
    purge_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // the startup purge already ran
    purge_tick.tick().await;

    let schedule = match config.vacuum_schedule.as_deref().map(cron::Schedule::from_str) {
        Some(Ok(s)) => Some(s),
        Some(Err(e)) => {
            warn!(error = %e, "invalid vacuum_schedule, falling back to vacuum_interval_secs");
            None
        }
        None => None,
    };
    let vacuum_every = Duration::from_secs(config.vacuum_interval_secs);
    let vacuum_sleep = tokio::time::sleep(next_vacuum_delay(
        schedule.as_ref(),
        Local::now(),
        vacuum_every,
    ));
    tokio::pin!(vacuum_sleep);

    loop {
        tokio::select! {
            _ = purge_tick.tick() => {
                if let Err(e) = purge_once(&repo, &config).await {
                    warn!(error = %e, "purge failed");
                }
            }
            _ = &mut vacuum_sleep => {
                match repo.vacuum().await {
                    Ok(()) => info!("vacuum complete"),
                    Err(e) => warn!(error = %e, "vacuum failed"),
                }
                let delay = next_vacuum_delay(schedule.as_ref(), Local::now(), vacuum_every);
                debug!(delay_secs = delay.as_secs(), "next vacuum scheduled");
                vacuum_sleep.as_mut().reset(tokio::time::Instant::now() + delay);
            }
        }
    }
}

/// Deletes every record older than `now - ttl_hours`. Used by the worker loop and at startup.
pub async fn purge_once(repo: &RecordRepo, config: &RetentionConfig) -> crate::error::Result<u64> {
    purge_at(repo, config, Utc::now()).await
}

pub async fn purge_at(
    repo: &RecordRepo,
    config: &RetentionConfig,
    now: DateTime<Utc>,
) -> crate::error::Result<u64> {
    let ttl = chrono::Duration::hours(i64::from(config.ttl_hours));
    let deleted = repo.purge_older_than(now, ttl).await?;
    if deleted > 0 {
        info!(deleted_rows = deleted, ttl_hours = config.ttl_hours, "purged old records");
    }
    Ok(deleted)
}

/// Time until the next VACUUM. Cron schedules are evaluated in local time; without one (or
/// once it has no future firing) the fixed interval applies.
pub fn next_vacuum_delay(
    schedule: Option<&cron::Schedule>,
    now: DateTime<Local>,
    interval: Duration,
) -> Duration {
    schedule
        .and_then(|s| s.after(&now).next())
        .and_then(|next| (next - now).to_std().ok())
        .unwrap_or(interval)
}
