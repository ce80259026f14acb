//! Domain service for hardware/software issue reports.

use serde::{Deserialize, Serialize};

use crate::domain::{IssuePriority, IssueStatus};
use crate::entities::issues;
use crate::services::ServiceError;
use crate::services::access::Actor;

#[derive(Debug, Clone, Deserialize)]
pub struct IssueReport {
    pub computer_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: IssuePriority,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueStatusUpdate {
    pub status: IssueStatus,
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueView {
    #[serde(flatten)]
    pub issue: issues::Model,
    pub computer_name: Option<String>,
    pub reporter_name: Option<String>,
}

#[async_trait::async_trait]
pub trait IssueService: Send + Sync {
    /// Issues visible to the caller, newest first.
    async fn list(
        &self,
        actor: &Actor,
        status: Option<IssueStatus>,
    ) -> Result<Vec<IssueView>, ServiceError>;

    async fn get(&self, actor: &Actor, id: &str) -> Result<issues::Model, ServiceError>;

    /// Files a `pending` issue reported by the caller.
    async fn report(&self, actor: &Actor, report: IssueReport)
    -> Result<issues::Model, ServiceError>;

    /// Staff-only, forward-only status change.
    ///
    /// Moving to `resolved` or `closed` stamps `resolved_at` and `resolved_by`.
    async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        update: IssueStatusUpdate,
    ) -> Result<issues::Model, ServiceError>;
}
