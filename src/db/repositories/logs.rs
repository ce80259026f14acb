use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
    Set,
};

use crate::domain::clock;
use crate::entities::{prelude::*, system_logs};

/// Filters shared by the paged and unpaged queries.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub level: Option<String>,
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl LogFilter {
    fn apply(self, mut query: Select<SystemLogs>) -> Select<SystemLogs> {
        if let Some(level) = self.level {
            query = query.filter(system_logs::Column::Level.eq(level));
        }
        if let Some(event_type) = self.event_type {
            query = query.filter(system_logs::Column::EventType.contains(event_type));
        }
        if let Some(start) = self.start_date {
            query = query.filter(system_logs::Column::CreatedAt.gte(start));
        }
        if let Some(end) = self.end_date {
            query = query.filter(system_logs::Column::CreatedAt.lte(end));
        }
        query
    }
}

pub struct LogRepository {
    conn: DatabaseConnection,
}

impl LogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        event_type: &str,
        level: &str,
        message: &str,
        details: Option<String>,
    ) -> Result<()> {
        let active_model = system_logs::ActiveModel {
            event_type: Set(event_type.to_string()),
            level: Set(level.to_string()),
            message: Set(message.to_string()),
            details: Set(details),
            created_at: Set(clock::now_stamp()),
            ..Default::default()
        };

        SystemLogs::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert system log")?;
        Ok(())
    }

    /// Returns one page (1-based) and the total number of pages.
    pub async fn get_logs(
        &self,
        page: u64,
        page_size: u64,
        filter: LogFilter,
    ) -> Result<(Vec<system_logs::Model>, u64)> {
        let query = filter.apply(SystemLogs::find().order_by_desc(system_logs::Column::Id));

        let paginator = query.paginate(&self.conn, page_size.max(1));
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total_pages))
    }

    pub async fn clear_logs(&self) -> Result<u64> {
        let result = SystemLogs::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }

    pub async fn prune_logs(&self, older_than_days: i64) -> Result<u64> {
        let cutoff = clock::stamp(Utc::now() - Duration::days(older_than_days));

        let result = SystemLogs::delete_many()
            .filter(system_logs::Column::CreatedAt.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to prune system logs")?;

        Ok(result.rows_affected)
    }
}
