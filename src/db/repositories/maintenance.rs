use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;

use crate::domain::clock;
use crate::entities::{maintenance_logs, prelude::*};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMaintenance {
    pub computer_id: String,
    pub maintenance_type: String,
    pub description: String,
    pub parts_replaced: Option<String>,
    pub cost: Option<f64>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub notes: Option<String>,
}

pub struct MaintenanceRepository {
    conn: DatabaseConnection,
}

impl MaintenanceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, computer_id: Option<&str>) -> Result<Vec<maintenance_logs::Model>> {
        let mut query = MaintenanceLogs::find().order_by_desc(maintenance_logs::Column::StartedAt);
        if let Some(computer_id) = computer_id {
            query = query.filter(maintenance_logs::Column::ComputerId.eq(computer_id));
        }
        query
            .all(&self.conn)
            .await
            .context("Failed to list maintenance logs")
    }

    pub async fn get(&self, id: &str) -> Result<Option<maintenance_logs::Model>> {
        MaintenanceLogs::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query maintenance log")
    }

    /// `started_at` and `completed_at` must already be normalised stamps.
    pub async fn create(
        &self,
        input: NewMaintenance,
        performed_by: &str,
    ) -> Result<maintenance_logs::Model> {
        let now = clock::now_stamp();
        maintenance_logs::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            computer_id: Set(input.computer_id),
            performed_by: Set(performed_by.to_string()),
            maintenance_type: Set(input.maintenance_type),
            description: Set(input.description),
            parts_replaced: Set(input.parts_replaced),
            cost: Set(input.cost),
            started_at: Set(input.started_at.unwrap_or_else(|| now.clone())),
            completed_at: Set(input.completed_at),
            notes: Set(input.notes),
            created_at: Set(now),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert maintenance log")
    }

    pub async fn complete(
        &self,
        log: maintenance_logs::Model,
        completed_at: &str,
    ) -> Result<maintenance_logs::Model> {
        let mut active: maintenance_logs::ActiveModel = log.into();
        active.completed_at = Set(Some(completed_at.to_string()));
        active
            .update(&self.conn)
            .await
            .context("Failed to complete maintenance log")
    }

    /// Latest completion stamp per computer, in one grouped query.
    pub async fn last_completed_by_computer(&self) -> Result<HashMap<String, String>> {
        let rows: Vec<(String, Option<String>)> = MaintenanceLogs::find()
            .select_only()
            .column(maintenance_logs::Column::ComputerId)
            .column_as(maintenance_logs::Column::CompletedAt.max(), "last_completed")
            .filter(maintenance_logs::Column::CompletedAt.is_not_null())
            .group_by(maintenance_logs::Column::ComputerId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to aggregate maintenance history")?;

        Ok(rows
            .into_iter()
            .filter_map(|(computer_id, last)| last.map(|last| (computer_id, last)))
            .collect())
    }
}
