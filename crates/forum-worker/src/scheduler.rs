//! Cron scheduler driving the recurring maintenance sweep.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{info, warn};

use forum_core::config::maintenance::MaintenanceConfig;
use forum_core::error::AppError;

use crate::sweep::MaintenanceSweeper;

/// Owns the recurring sweep: one run at startup, then the configured cron
/// cadence until shutdown.
pub struct MaintenanceScheduler {
    scheduler: JobScheduler,
    sweeper: Arc<MaintenanceSweeper>,
    in_progress: Arc<AtomicBool>,
    config: MaintenanceConfig,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish()
    }
}

impl MaintenanceScheduler {
    /// Create a scheduler over the given sweeper.
    pub async fn new(
        sweeper: Arc<MaintenanceSweeper>,
        config: MaintenanceConfig,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            sweeper,
            in_progress: Arc::new(AtomicBool::new(false)),
            config,
        })
    }

    /// Run the startup sweep, register the recurring job, and start the
    /// timer.
    pub async fn start(&self) -> Result<(), AppError> {
        if self.config.run_on_startup {
            run_sweep_guarded(Arc::clone(&self.sweeper), Arc::clone(&self.in_progress)).await;
        }

        let sweeper = Arc::clone(&self.sweeper);
        let in_progress = Arc::clone(&self.in_progress);
        let job = CronJob::new_async(self.config.schedule.as_str(), move |_uuid, _lock| {
            let sweeper = Arc::clone(&sweeper);
            let in_progress = Arc::clone(&in_progress);
            Box::pin(async move {
                run_sweep_guarded(sweeper, in_progress).await;
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create sweep schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {e}")))?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!(schedule = %self.config.schedule, "Maintenance scheduler started");
        Ok(())
    }

    /// Clear the timer. In-flight sweep operations are abandoned without
    /// rollback; the sweep is idempotent, so the next start picks up where
    /// this one left off.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Maintenance scheduler shut down");
        Ok(())
    }
}

/// Run one sweep unless a previous one is still in flight.
///
/// Overlapping ticks are skipped; every operation in the sweep is idempotent
/// so an overlap would be harmless, but skipping keeps one sweep's report
/// coherent. A sweep failure never terminates the scheduler or the process —
/// the next tick proceeds regardless.
async fn run_sweep_guarded(sweeper: Arc<MaintenanceSweeper>, in_progress: Arc<AtomicBool>) {
    if in_progress
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        warn!("Previous sweep still running, skipping this tick");
        return;
    }

    let report = sweeper.sweep().await;
    for error in &report.errors {
        warn!(stage = %error.stage, detail = %error.detail, "Sweep step failed");
    }

    in_progress.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use forum_core::config::retention::RetentionConfig;
    use forum_database::memory::MemoryForumStore;
    use forum_database::{AccountStore, EphemeralStore, SessionStore};
    use forum_entity::ephemeral::{EphemeralKind, EphemeralRecord};

    use super::*;

    #[tokio::test]
    async fn test_startup_sweep_runs_before_the_timer() {
        let store = Arc::new(MemoryForumStore::new());
        let stale = EphemeralRecord::new(
            EphemeralKind::PresencePing,
            serde_json::json!({}),
            Utc::now() - Duration::days(2),
        );
        EphemeralStore::insert(store.as_ref(), &stale).await.unwrap();

        let sweeper = Arc::new(MaintenanceSweeper::new(
            Arc::clone(&store) as Arc<dyn EphemeralStore>,
            Arc::clone(&store) as Arc<dyn AccountStore>,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            RetentionConfig::default(),
        ));

        let scheduler = MaintenanceScheduler::new(sweeper, MaintenanceConfig::default())
            .await
            .unwrap();
        scheduler.start().await.unwrap();

        assert_eq!(
            store.count_by_kind(EphemeralKind::PresencePing).await.unwrap(),
            0
        );

        scheduler.shutdown().await.unwrap();
    }
}
