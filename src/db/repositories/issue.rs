use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};

use crate::domain::{IssuePriority, IssueStatus, clock};
use crate::entities::{issues, prelude::*};
use crate::services::access::Scope;

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub computer_id: String,
    pub reported_by: String,
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub resolved_by: String,
    pub resolved_at: String,
    pub notes: Option<String>,
}

fn scoped(scope: &Scope) -> Select<Issues> {
    let query = Issues::find();
    match scope.owner() {
        Some(owner) => query.filter(issues::Column::ReportedBy.eq(owner)),
        None => query,
    }
}

pub struct IssueRepository {
    conn: DatabaseConnection,
}

impl IssueRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        scope: &Scope,
        status: Option<IssueStatus>,
    ) -> Result<Vec<issues::Model>> {
        let mut query = scoped(scope).order_by_desc(issues::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(issues::Column::Status.eq(status));
        }
        query.all(&self.conn).await.context("Failed to list issues")
    }

    pub async fn get(&self, id: &str) -> Result<Option<issues::Model>> {
        Issues::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query issue")
    }

    pub async fn create(&self, issue: NewIssue) -> Result<issues::Model> {
        issues::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            computer_id: Set(issue.computer_id),
            reported_by: Set(issue.reported_by),
            title: Set(issue.title),
            description: Set(issue.description),
            priority: Set(issue.priority),
            status: Set(IssueStatus::Pending),
            resolution_notes: Set(None),
            resolved_at: Set(None),
            resolved_by: Set(None),
            created_at: Set(issue.created_at.clone()),
            updated_at: Set(issue.created_at),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert issue")
    }

    pub async fn set_status(
        &self,
        issue: issues::Model,
        status: IssueStatus,
        resolution: Option<Resolution>,
    ) -> Result<issues::Model> {
        let mut active: issues::ActiveModel = issue.into();
        active.status = Set(status);
        if let Some(resolution) = resolution {
            active.resolved_at = Set(Some(resolution.resolved_at));
            active.resolved_by = Set(Some(resolution.resolved_by));
            if resolution.notes.is_some() {
                active.resolution_notes = Set(resolution.notes);
            }
        }
        active.updated_at = Set(clock::now_stamp());
        active
            .update(&self.conn)
            .await
            .context("Failed to update issue status")
    }

    /// Deletes every issue created strictly before `cutoff`, whatever its status.
    pub async fn delete_created_before(&self, cutoff: &str) -> Result<u64> {
        let result = Issues::delete_many()
            .filter(issues::Column::CreatedAt.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to delete old issues")?;
        Ok(result.rows_affected)
    }

    pub async fn count(&self, scope: &Scope, status: Option<IssueStatus>) -> Result<u64> {
        let mut query = scoped(scope);
        if let Some(status) = status {
            query = query.filter(issues::Column::Status.eq(status));
        }
        query
            .count(&self.conn)
            .await
            .context("Failed to count issues")
    }

    /// Issue counts per status for issues created within `[from, to]`.
    pub async fn count_by_status(&self, from: &str, to: &str) -> Result<Vec<(IssueStatus, i64)>> {
        Issues::find()
            .select_only()
            .column(issues::Column::Status)
            .column_as(issues::Column::Id.count(), "count")
            .filter(issues::Column::CreatedAt.gte(from))
            .filter(issues::Column::CreatedAt.lte(to))
            .group_by(issues::Column::Status)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count issues by status")
    }
}
