//! One-shot issue cleanup

use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::services::CleanupService;

pub async fn cmd_cleanup(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);
    let retention = config.cleanup.issue_retention_minutes;

    let cleanup = CleanupService::new(store, Arc::new(RwLock::new(config.clone())), event_bus);
    let deleted = cleanup.run().await?;

    println!("Deleted {deleted} issue(s) older than {retention} minutes.");
    Ok(())
}
