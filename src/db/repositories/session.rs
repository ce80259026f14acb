use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
    sea_query::Expr,
};

use crate::domain::clock;
use crate::entities::{prelude::*, session_logs};
use crate::services::access::Scope;

fn scoped(scope: &Scope) -> Select<SessionLogs> {
    let query = SessionLogs::find();
    match scope.owner() {
        Some(owner) => query.filter(session_logs::Column::UserId.eq(owner)),
        None => query,
    }
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        scope: &Scope,
        user_id: Option<&str>,
    ) -> Result<Vec<session_logs::Model>> {
        let mut query = scoped(scope).order_by_desc(session_logs::Column::LoginTime);
        if let Some(user_id) = user_id {
            query = query.filter(session_logs::Column::UserId.eq(user_id));
        }
        query
            .all(&self.conn)
            .await
            .context("Failed to list sessions")
    }

    pub async fn get(&self, id: &str) -> Result<Option<session_logs::Model>> {
        SessionLogs::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query session")
    }

    pub async fn start(
        &self,
        computer_id: &str,
        user_id: &str,
        login_time: &str,
    ) -> Result<session_logs::Model> {
        session_logs::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            computer_id: Set(computer_id.to_string()),
            user_id: Set(user_id.to_string()),
            login_time: Set(login_time.to_string()),
            logout_time: Set(None),
            duration_minutes: Set(None),
            created_at: Set(clock::now_stamp()),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert session")
    }

    /// Writes logout time and duration together, only if the session is
    /// still open. Returns false when another writer ended it first.
    pub async fn end(&self, id: &str, logout_time: &str, duration_minutes: i32) -> Result<bool> {
        let result = SessionLogs::update_many()
            .col_expr(session_logs::Column::LogoutTime, Expr::value(logout_time))
            .col_expr(
                session_logs::Column::DurationMinutes,
                Expr::value(duration_minutes),
            )
            .filter(session_logs::Column::Id.eq(id))
            .filter(session_logs::Column::LogoutTime.is_null())
            .exec(&self.conn)
            .await
            .context("Failed to end session")?;

        Ok(result.rows_affected == 1)
    }

    /// Ended sessions with login in `[from, to]` as `(computer_id, minutes)`.
    pub async fn durations_between(&self, from: &str, to: &str) -> Result<Vec<(String, i32)>> {
        let rows: Vec<(String, Option<i32>)> = SessionLogs::find()
            .select_only()
            .column(session_logs::Column::ComputerId)
            .column(session_logs::Column::DurationMinutes)
            .filter(session_logs::Column::LoginTime.gte(from))
            .filter(session_logs::Column::LoginTime.lte(to))
            .filter(session_logs::Column::DurationMinutes.is_not_null())
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query session durations")?;

        Ok(rows
            .into_iter()
            .map(|(computer_id, minutes)| (computer_id, minutes.unwrap_or(0)))
            .collect())
    }
}
