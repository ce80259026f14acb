use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::CleanupConfig;
use crate::services::CleanupService;

/// Daily at 03:00.
const LOG_PRUNE_CRON: &str = "0 0 3 * * *";

pub struct Scheduler {
    cleanup: Arc<CleanupService>,
    config: CleanupConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(cleanup: Arc<CleanupService>, config: CleanupConfig) -> Self {
        Self {
            cleanup,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduled cleanup is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let mut sched = JobScheduler::new().await?;

        let running = Arc::clone(&self.running);
        let cleanup = Arc::clone(&self.cleanup);
        let job = Job::new_async(self.config.cron_expression.as_str(), move |_uuid, _lock| {
            let cleanup = Arc::clone(&cleanup);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                let start = std::time::Instant::now();
                info!(event = "job_started", job_name = "cleanup_old_issues", "Starting scheduled issue cleanup");

                match cleanup.run().await {
                    Ok(deleted) => info!(
                        event = "job_finished",
                        job_name = "cleanup_old_issues",
                        deleted,
                        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Scheduled issue cleanup finished"
                    ),
                    Err(e) => error!(event = "job_failed", job_name = "cleanup_old_issues", error = %e, "Scheduled issue cleanup failed"),
                }
            })
        })?;

        let cleanup = Arc::clone(&self.cleanup);
        let prune_job = Job::new_async(LOG_PRUNE_CRON, move |_uuid, _lock| {
            let cleanup = Arc::clone(&cleanup);
            Box::pin(async move {
                if let Err(e) = cleanup.prune_logs().await {
                    error!(event = "job_failed", job_name = "prune_logs", error = %e, "Scheduled log pruning failed");
                }
            })
        })?;

        sched.add(job).await?;
        sched.add(prune_job).await?;
        sched.start().await?;

        info!("Issue cleanup scheduled: {}", self.config.cron_expression);
        info!("Log pruning scheduled: {}", LOG_PRUNE_CRON);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }
}
