// Retention cleanup for processed outbox messages.
//
// Responsibilities
// - Delete processed messages whose processed_date is older than the retention period.
//   Pending and dead-lettered messages are never removed.
// - Own the retention configuration: period (at least one day) and an on/off toggle.
// - Run on a cron schedule until shutdown. Scheduled-run failures are logged, never raised.

use crate::shared::infrastructure::outbox::{
    OutboxError, OutboxStore, RetentionSettings, RetentionSettingsStore,
};
use chrono::{DateTime, TimeDelta, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

pub const DEFAULT_CLEANUP_CRON: &str = "0 0 0 * * ?";

/// Cron schedule in `sec min hour day-of-month month day-of-week [year]` form. `?` is
/// accepted as "no specific value".
#[derive(Debug, Clone)]
pub struct CleanupSchedule {
    expression: String,
    schedule: Schedule,
}

impl CleanupSchedule {
    pub fn parse(expression: &str) -> Result<Self, OutboxError> {
        let normalized = expression.trim().replace('?', "*");
        let schedule = Schedule::from_str(&normalized).map_err(|e| {
            OutboxError::InvalidArgument(format!("invalid cleanup cron {expression:?}: {e}"))
        })?;
        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&now).next()
    }
}

pub struct OutboxCleanupService<TStore>
where
    TStore: OutboxStore + RetentionSettingsStore + ?Sized,
{
    store: Arc<TStore>,
}

impl<TStore> OutboxCleanupService<TStore>
where
    TStore: OutboxStore + RetentionSettingsStore + ?Sized,
{
    pub fn new(store: Arc<TStore>) -> Self {
        Self { store }
    }

    pub async fn settings(&self) -> Result<RetentionSettings, OutboxError> {
        self.store.load().await
    }

    pub async fn configure_retention_period(&self, days: i64) -> Result<(), OutboxError> {
        if days < 1 {
            return Err(OutboxError::InvalidArgument(format!(
                "retention period must be at least 1 day, got {days}"
            )));
        }
        self.store.set_retention_days(days).await?;
        info!(retention_days = days, "Outbox retention period updated");
        Ok(())
    }

    pub async fn set_cleanup_enabled(&self, enabled: bool) -> Result<(), OutboxError> {
        self.store.set_enabled(enabled).await?;
        info!(enabled, "Outbox cleanup toggled");
        Ok(())
    }

    pub async fn run_cleanup(&self) -> Result<u64, OutboxError> {
        self.run_cleanup_at(Utc::now()).await
    }

    /// Removes processed messages older than `now - retention_days`. Returns the count.
    pub async fn run_cleanup_at(&self, now: DateTime<Utc>) -> Result<u64, OutboxError> {
        let settings = self.store.load().await?;
        if !settings.enabled {
            info!("Outbox cleanup disabled, skipping");
            return Ok(0);
        }
        let cutoff = TimeDelta::try_days(settings.retention_days)
            .and_then(|retention| now.checked_sub_signed(retention))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.store.delete_processed_before(cutoff).await?;
        info!(
            removed,
            retention_days = settings.retention_days,
            cutoff = %cutoff,
            "Outbox cleanup completed"
        );
        Ok(removed)
    }

    /// Runs a cleanup at every scheduled instant until `shutdown` flips to `true`.
    pub async fn run(&self, schedule: CleanupSchedule, mut shutdown: watch::Receiver<bool>) {
        info!(cron = schedule.expression(), "Outbox cleanup scheduler started");
        while !*shutdown.borrow() {
            let now = Utc::now();
            let Some(next) = schedule.next_after(now) else {
                warn!(cron = schedule.expression(), "Cleanup schedule has no upcoming run");
                break;
            };
            debug!(next_run = %next, "Next outbox cleanup scheduled");
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                _ = sleep(wait) => {
                    if let Err(e) = self.run_cleanup().await {
                        error!(error = %e, "Outbox cleanup failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Outbox cleanup scheduler stopped");
    }
}
