use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{RwLock, broadcast};
use tracing::{error, info};

use crate::config::Config;
use crate::db::Store;
use crate::domain::clock;
use crate::domain::events::LabEvent;
use crate::services::ServiceError;

/// Purges issues older than the configured retention window.
pub struct CleanupService {
    store: Store,
    config: Arc<RwLock<Config>>,
    event_bus: broadcast::Sender<LabEvent>,
}

impl CleanupService {
    #[must_use]
    pub const fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<LabEvent>,
    ) -> Self {
        Self {
            store,
            config,
            event_bus,
        }
    }

    /// Deletes every issue created strictly before `cutoff`, whatever its status.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, ServiceError> {
        let deleted = match self
            .store
            .issues()
            .delete_created_before(&clock::stamp(cutoff))
            .await
        {
            Ok(deleted) => deleted,
            Err(e) => {
                error!(event = "cleanup_failed", error = %e, "Failed to delete old issues");
                let _ = self.event_bus.send(LabEvent::Error {
                    message: "Failed to delete old issues".to_string(),
                });
                return Err(e.into());
            }
        };

        metrics::counter!("issues_purged_total").increment(deleted);
        info!(event = "issues_purged", deleted, cutoff = %clock::stamp(cutoff), "Old issues purged");

        if deleted > 0 {
            let _ = self.event_bus.send(LabEvent::IssuesPurged { deleted });
        }

        Ok(deleted)
    }

    /// One cleanup pass relative to now.
    pub async fn run(&self) -> Result<u64, ServiceError> {
        let retention = self.config.read().await.cleanup.issue_retention_minutes;
        self.purge_older_than(Utc::now() - Duration::minutes(retention))
            .await
    }

    /// Drops system log rows past `general.log_retention_days`.
    pub async fn prune_logs(&self) -> Result<u64, ServiceError> {
        let days = self.config.read().await.general.log_retention_days;
        let pruned = self.store.prune_logs(days).await?;
        if pruned > 0 {
            info!(event = "logs_pruned", pruned, days, "Old system logs pruned");
        }
        Ok(pruned)
    }
}
