use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::domain::{NoticePriority, clock};
use crate::entities::{lab_notices, prelude::*};

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotice {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub priority: NoticePriority,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub expires_at: Option<String>,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticeChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub priority: Option<NoticePriority>,
    pub is_active: Option<bool>,
    /// `Some(None)` clears the expiry.
    #[serde(default, with = "double_option")]
    pub expires_at: Option<Option<String>>,
}

/// Distinguishes a missing field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

pub struct NoticeRepository {
    conn: DatabaseConnection,
}

impl NoticeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Newest first. With `visible_at`, only active and unexpired notices.
    pub async fn list(&self, visible_at: Option<&str>) -> Result<Vec<lab_notices::Model>> {
        let mut query = LabNotices::find().order_by_desc(lab_notices::Column::CreatedAt);
        if let Some(now) = visible_at {
            query = query.filter(lab_notices::Column::IsActive.eq(true)).filter(
                Condition::any()
                    .add(lab_notices::Column::ExpiresAt.is_null())
                    .add(lab_notices::Column::ExpiresAt.gt(now)),
            );
        }
        query
            .all(&self.conn)
            .await
            .context("Failed to list notices")
    }

    pub async fn get(&self, id: &str) -> Result<Option<lab_notices::Model>> {
        LabNotices::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query notice")
    }

    pub async fn create(&self, input: NewNotice, created_by: &str) -> Result<lab_notices::Model> {
        let now = clock::now_stamp();
        lab_notices::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            title: Set(input.title),
            content: Set(input.content),
            priority: Set(input.priority),
            is_active: Set(input.is_active),
            expires_at: Set(input.expires_at),
            created_by: Set(created_by.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert notice")
    }

    pub async fn update(
        &self,
        id: &str,
        changes: NoticeChanges,
    ) -> Result<Option<lab_notices::Model>> {
        let Some(notice) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: lab_notices::ActiveModel = notice.into();
        if let Some(v) = changes.title {
            active.title = Set(v);
        }
        if let Some(v) = changes.content {
            active.content = Set(v);
        }
        if let Some(v) = changes.priority {
            active.priority = Set(v);
        }
        if let Some(v) = changes.is_active {
            active.is_active = Set(v);
        }
        if let Some(v) = changes.expires_at {
            active.expires_at = Set(v);
        }
        active.updated_at = Set(clock::now_stamp());

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = LabNotices::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete notice")?;
        Ok(result.rows_affected > 0)
    }
}
