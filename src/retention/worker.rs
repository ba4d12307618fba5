use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;

use crate::quota::{QuotaError, QuotaPolicy};

/// Entries strictly older than this instant are eligible for deletion.
/// Anchored on today's boundary so the current day is always kept.
pub fn retention_cutoff(
    policy: &QuotaPolicy,
    now: DateTime<Utc>,
    retention_days: u32,
) -> DateTime<Utc> {
    policy.day_boundary(now) - Duration::days(retention_days.into())
}

/// Runs one purge pass and returns the number of deleted entries
pub async fn sweep_once(policy: &QuotaPolicy, retention_days: u32) -> Result<u64, QuotaError> {
    let cutoff = retention_cutoff(policy, policy.now(), retention_days);
    let purged = policy.ledger().purge_before(cutoff).await?;

    if purged > 0 {
        log::info!(
            "Retention sweep removed {} usage entries older than {}",
            purged,
            cutoff
        );
    }

    Ok(purged)
}

/// Spawns the periodic sweep when a retention period is configured
pub fn spawn_if_configured(policy: QuotaPolicy) -> Option<JoinHandle<()>> {
    let retention_days = policy.config().retention_days?;
    let period = policy.config().retention_interval;

    log::info!(
        "Usage retention enabled: keeping {} days, sweeping every {:?}",
        retention_days,
        period
    );

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(e) = sweep_once(&policy, retention_days).await {
                // Next tick retries; quota checks are unaffected
                log::warn!("Retention sweep failed: {}", e);
            }
        }
    }))
}
