use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::domain::clock;
use crate::entities::{computer_software, prelude::*, software};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSoftware {
    pub name: String,
    pub version: Option<String>,
    pub vendor: Option<String>,
    pub license_key: Option<String>,
    pub license_expiry: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SoftwareChanges {
    pub name: Option<String>,
    pub version: Option<String>,
    pub vendor: Option<String>,
    pub license_key: Option<String>,
    pub license_expiry: Option<String>,
    pub notes: Option<String>,
}

fn active_model(input: NewSoftware, now: &str) -> software::ActiveModel {
    software::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        name: Set(input.name.trim().to_string()),
        version: Set(input.version),
        vendor: Set(input.vendor),
        license_key: Set(input.license_key),
        license_expiry: Set(input.license_expiry),
        notes: Set(input.notes),
        created_at: Set(now.to_string()),
        updated_at: Set(now.to_string()),
    }
}

pub struct SoftwareRepository {
    conn: DatabaseConnection,
}

impl SoftwareRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Every package with its installation count, by name.
    pub async fn list_with_counts(&self) -> Result<Vec<(software::Model, i64)>> {
        let packages = Software::find()
            .order_by_asc(software::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list software")?;

        let counts: HashMap<String, i64> = ComputerSoftware::find()
            .select_only()
            .column(computer_software::Column::SoftwareId)
            .column_as(computer_software::Column::Id.count(), "count")
            .group_by(computer_software::Column::SoftwareId)
            .into_tuple::<(String, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to count installations")?
            .into_iter()
            .collect();

        Ok(packages
            .into_iter()
            .map(|p| {
                let count = counts.get(&p.id).copied().unwrap_or(0);
                (p, count)
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<software::Model>> {
        Software::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query software")
    }

    pub async fn create(&self, input: NewSoftware) -> Result<software::Model> {
        active_model(input, &clock::now_stamp())
            .insert(&self.conn)
            .await
            .context("Failed to insert software")
    }

    /// Inserts every row or none.
    pub async fn create_many(&self, inputs: Vec<NewSoftware>) -> Result<usize> {
        let count = inputs.len();
        let now = clock::now_stamp();
        let txn = self.conn.begin().await?;
        for input in inputs {
            active_model(input, &now)
                .insert(&txn)
                .await
                .context("Failed to insert imported software")?;
        }
        txn.commit().await?;
        Ok(count)
    }

    pub async fn update(
        &self,
        id: &str,
        changes: SoftwareChanges,
    ) -> Result<Option<software::Model>> {
        let Some(package) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: software::ActiveModel = package.into();
        if let Some(v) = changes.name {
            active.name = Set(v.trim().to_string());
        }
        if let Some(v) = changes.version {
            active.version = Set(Some(v));
        }
        if let Some(v) = changes.vendor {
            active.vendor = Set(Some(v));
        }
        if let Some(v) = changes.license_key {
            active.license_key = Set(Some(v));
        }
        if let Some(v) = changes.license_expiry {
            active.license_expiry = Set(Some(v));
        }
        if let Some(v) = changes.notes {
            active.notes = Set(Some(v));
        }
        active.updated_at = Set(clock::now_stamp());

        Ok(Some(active.update(&self.conn).await?))
    }

    /// Removes the package and its installations together. Returns the
    /// number of installations removed, or `None` if it did not exist.
    pub async fn delete(&self, id: &str) -> Result<Option<u64>> {
        let txn = self.conn.begin().await?;

        let installs = ComputerSoftware::delete_many()
            .filter(computer_software::Column::SoftwareId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        let deleted = Software::delete_by_id(id).exec(&txn).await?.rows_affected;

        if deleted == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        txn.commit().await?;
        Ok(Some(installs))
    }

    pub async fn is_installed(&self, computer_id: &str, software_id: &str) -> Result<bool> {
        let count = ComputerSoftware::find()
            .filter(computer_software::Column::ComputerId.eq(computer_id))
            .filter(computer_software::Column::SoftwareId.eq(software_id))
            .count(&self.conn)
            .await
            .context("Failed to query installation")?;
        Ok(count > 0)
    }

    pub async fn install(
        &self,
        computer_id: &str,
        software_id: &str,
    ) -> Result<computer_software::Model> {
        computer_software::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            computer_id: Set(computer_id.to_string()),
            software_id: Set(software_id.to_string()),
            installed_at: Set(clock::now_stamp()),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert installation")
    }

    pub async fn uninstall(&self, computer_id: &str, software_id: &str) -> Result<bool> {
        let result = ComputerSoftware::delete_many()
            .filter(computer_software::Column::ComputerId.eq(computer_id))
            .filter(computer_software::Column::SoftwareId.eq(software_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete installation")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn installations(&self, software_id: &str) -> Result<Vec<computer_software::Model>> {
        ComputerSoftware::find()
            .filter(computer_software::Column::SoftwareId.eq(software_id))
            .order_by_desc(computer_software::Column::InstalledAt)
            .all(&self.conn)
            .await
            .context("Failed to list installations")
    }

    /// Packages with a license expiry at or before `cutoff`, soonest first.
    pub async fn licenses_expiring_by(&self, cutoff: &str) -> Result<Vec<software::Model>> {
        Software::find()
            .filter(software::Column::LicenseExpiry.is_not_null())
            .filter(software::Column::LicenseExpiry.lte(cutoff))
            .order_by_asc(software::Column::LicenseExpiry)
            .all(&self.conn)
            .await
            .context("Failed to query expiring licenses")
    }

    pub async fn count(&self) -> Result<u64> {
        Software::find()
            .count(&self.conn)
            .await
            .context("Failed to count software")
    }
}
