use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set, TransactionTrait,
};

use crate::domain::clock;
use crate::entities::{notifications, prelude::*};
use crate::services::access::Scope;

/// A notification body, addressed separately.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

fn active_model(user_id: &str, msg: &Message, now: &str) -> notifications::ActiveModel {
    notifications::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        kind: Set(msg.kind.clone()),
        title: Set(msg.title.clone()),
        message: Set(msg.message.clone()),
        link: Set(msg.link.clone()),
        read: Set(false),
        created_at: Set(now.to_string()),
    }
}

fn scoped(scope: &Scope) -> Select<Notifications> {
    let query = Notifications::find();
    match scope.owner() {
        Some(owner) => query.filter(notifications::Column::UserId.eq(owner)),
        None => query,
    }
}

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        scope: &Scope,
        unread_only: bool,
    ) -> Result<Vec<notifications::Model>> {
        let mut query = scoped(scope).order_by_desc(notifications::Column::CreatedAt);
        if unread_only {
            query = query.filter(notifications::Column::Read.eq(false));
        }
        query
            .all(&self.conn)
            .await
            .context("Failed to list notifications")
    }

    pub async fn get(&self, id: &str) -> Result<Option<notifications::Model>> {
        Notifications::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query notification")
    }

    pub async fn send(&self, user_id: &str, msg: &Message) -> Result<notifications::Model> {
        active_model(user_id, msg, &clock::now_stamp())
            .insert(&self.conn)
            .await
            .context("Failed to insert notification")
    }

    /// One row per recipient, all or none.
    pub async fn send_many(&self, user_ids: &[String], msg: &Message) -> Result<usize> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let now = clock::now_stamp();
        let txn = self.conn.begin().await?;
        Notifications::insert_many(user_ids.iter().map(|id| active_model(id, msg, &now)))
            .exec(&txn)
            .await
            .context("Failed to insert notifications")?;
        txn.commit().await?;

        Ok(user_ids.len())
    }

    pub async fn mark_read(&self, notification: notifications::Model) -> Result<notifications::Model> {
        let mut active: notifications::ActiveModel = notification.into();
        active.read = Set(true);
        active
            .update(&self.conn)
            .await
            .context("Failed to mark notification read")
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        let result = Notifications::update_many()
            .col_expr(
                notifications::Column::Read,
                sea_orm::sea_query::Expr::value(true),
            )
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::Read.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to mark notifications read")?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = Notifications::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete notification")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<u64> {
        Notifications::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::Read.eq(false))
            .count(&self.conn)
            .await
            .context("Failed to count unread notifications")
    }
}
