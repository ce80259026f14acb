use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::domain::{ComputerStatus, clock};
use crate::entities::{
    bookings, computer_software, computers, issues, maintenance_logs, prelude::*, session_logs,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComputer {
    pub system_id: String,
    pub name: String,
    pub location: Option<String>,
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub os_version: Option<String>,
    pub purchase_date: Option<String>,
    pub warranty_expiry: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub status: ComputerStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComputerChanges {
    pub system_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub os_version: Option<String>,
    pub purchase_date: Option<String>,
    pub warranty_expiry: Option<String>,
    pub notes: Option<String>,
    pub status: Option<ComputerStatus>,
}

/// Outcome of a delete attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputerDeletion {
    Deleted,
    NotFound,
    /// Rows in these tables still reference the computer.
    Referenced(Vec<&'static str>),
}

fn active_model(input: NewComputer, now: &str) -> computers::ActiveModel {
    computers::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        system_id: Set(input.system_id.trim().to_string()),
        name: Set(input.name.trim().to_string()),
        location: Set(input.location),
        processor: Set(input.processor),
        ram: Set(input.ram),
        storage: Set(input.storage),
        os_version: Set(input.os_version),
        purchase_date: Set(input.purchase_date),
        warranty_expiry: Set(input.warranty_expiry),
        notes: Set(input.notes),
        status: Set(input.status),
        created_at: Set(now.to_string()),
        updated_at: Set(now.to_string()),
    }
}

pub struct ComputerRepository {
    conn: DatabaseConnection,
}

impl ComputerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, status: Option<ComputerStatus>) -> Result<Vec<computers::Model>> {
        let mut query = Computers::find().order_by_asc(computers::Column::SystemId);
        if let Some(status) = status {
            query = query.filter(computers::Column::Status.eq(status));
        }
        query
            .all(&self.conn)
            .await
            .context("Failed to list computers")
    }

    pub async fn get(&self, id: &str) -> Result<Option<computers::Model>> {
        Computers::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query computer")
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        Ok(Computers::find_by_id(id).count(&self.conn).await? > 0)
    }

    pub async fn system_id_taken(&self, system_id: &str, except: Option<&str>) -> Result<bool> {
        let mut query = Computers::find().filter(computers::Column::SystemId.eq(system_id.trim()));
        if let Some(id) = except {
            query = query.filter(computers::Column::Id.ne(id));
        }
        Ok(query.count(&self.conn).await? > 0)
    }

    pub async fn create(&self, input: NewComputer) -> Result<computers::Model> {
        let now = clock::now_stamp();
        active_model(input, &now)
            .insert(&self.conn)
            .await
            .context("Failed to insert computer")
    }

    /// Inserts every row or none.
    pub async fn create_many(&self, inputs: Vec<NewComputer>) -> Result<usize> {
        let count = inputs.len();
        let now = clock::now_stamp();
        let txn = self.conn.begin().await?;
        for input in inputs {
            active_model(input, &now)
                .insert(&txn)
                .await
                .context("Failed to insert imported computer")?;
        }
        txn.commit().await?;
        Ok(count)
    }

    pub async fn update(
        &self,
        id: &str,
        changes: ComputerChanges,
    ) -> Result<Option<computers::Model>> {
        let Some(computer) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: computers::ActiveModel = computer.into();
        if let Some(v) = changes.system_id {
            active.system_id = Set(v.trim().to_string());
        }
        if let Some(v) = changes.name {
            active.name = Set(v.trim().to_string());
        }
        if let Some(v) = changes.location {
            active.location = Set(Some(v));
        }
        if let Some(v) = changes.processor {
            active.processor = Set(Some(v));
        }
        if let Some(v) = changes.ram {
            active.ram = Set(Some(v));
        }
        if let Some(v) = changes.storage {
            active.storage = Set(Some(v));
        }
        if let Some(v) = changes.os_version {
            active.os_version = Set(Some(v));
        }
        if let Some(v) = changes.purchase_date {
            active.purchase_date = Set(Some(v));
        }
        if let Some(v) = changes.warranty_expiry {
            active.warranty_expiry = Set(Some(v));
        }
        if let Some(v) = changes.notes {
            active.notes = Set(Some(v));
        }
        if let Some(v) = changes.status {
            active.status = Set(v);
        }
        active.updated_at = Set(clock::now_stamp());

        Ok(Some(active.update(&self.conn).await?))
    }

    /// Removes the computer and its software installations. Computers with
    /// bookings, sessions, issues or maintenance history are kept.
    pub async fn delete(&self, id: &str) -> Result<ComputerDeletion> {
        if !self.exists(id).await? {
            return Ok(ComputerDeletion::NotFound);
        }

        let mut referenced = Vec::new();
        if Bookings::find()
            .filter(bookings::Column::ComputerId.eq(id))
            .count(&self.conn)
            .await?
            > 0
        {
            referenced.push("bookings");
        }
        if SessionLogs::find()
            .filter(session_logs::Column::ComputerId.eq(id))
            .count(&self.conn)
            .await?
            > 0
        {
            referenced.push("session_logs");
        }
        if Issues::find()
            .filter(issues::Column::ComputerId.eq(id))
            .count(&self.conn)
            .await?
            > 0
        {
            referenced.push("issues");
        }
        if MaintenanceLogs::find()
            .filter(maintenance_logs::Column::ComputerId.eq(id))
            .count(&self.conn)
            .await?
            > 0
        {
            referenced.push("maintenance_logs");
        }
        if !referenced.is_empty() {
            return Ok(ComputerDeletion::Referenced(referenced));
        }

        let txn = self.conn.begin().await?;
        ComputerSoftware::delete_many()
            .filter(computer_software::Column::ComputerId.eq(id))
            .exec(&txn)
            .await?;
        Computers::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(ComputerDeletion::Deleted)
    }

    pub async fn count(&self, status: Option<ComputerStatus>) -> Result<u64> {
        let mut query = Computers::find();
        if let Some(status) = status {
            query = query.filter(computers::Column::Status.eq(status));
        }
        query
            .count(&self.conn)
            .await
            .context("Failed to count computers")
    }

    pub async fn count_by_status(&self) -> Result<Vec<(ComputerStatus, i64)>> {
        Computers::find()
            .select_only()
            .column(computers::Column::Status)
            .column_as(computers::Column::Id.count(), "count")
            .group_by(computers::Column::Status)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count computers by status")
    }

    /// `(id, system_id, name)` for every computer, for label lookups.
    pub async fn labels(&self) -> Result<Vec<(String, String, String)>> {
        Computers::find()
            .select_only()
            .column(computers::Column::Id)
            .column(computers::Column::SystemId)
            .column(computers::Column::Name)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list computer labels")
    }
}
