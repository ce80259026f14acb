//! `SeaORM` implementation of the `IssueService` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::constants::limits::{MAX_TEXT_LENGTH, MAX_TITLE_LENGTH};
use crate::constants::notification_kinds;
use crate::db::Store;
use crate::db::repositories::issue::{NewIssue, Resolution};
use crate::db::repositories::notification::Message;
use crate::domain::events::LabEvent;
use crate::domain::{IssueStatus, clock};
use crate::entities::issues;
use crate::services::ServiceError;
use crate::services::access::Actor;
use crate::services::issue_service::{IssueReport, IssueService, IssueStatusUpdate, IssueView};

pub struct SeaOrmIssueService {
    store: Store,
    event_bus: broadcast::Sender<LabEvent>,
}

impl SeaOrmIssueService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<LabEvent>) -> Self {
        Self { store, event_bus }
    }

    async fn notify_reporter(&self, issue: &issues::Model) {
        let msg = Message {
            kind: notification_kinds::ISSUE.to_string(),
            title: format!("Issue {}", issue.status),
            message: format!("Your issue \"{}\" is now {}.", issue.title, issue.status),
            link: Some("/issues".to_string()),
        };

        if let Err(e) = self.store.notifications().send(&issue.reported_by, &msg).await {
            warn!(error = %e, issue_id = %issue.id, "Failed to notify issue reporter");
        }
    }
}

fn validate_report(report: &IssueReport) -> Result<(), ServiceError> {
    let title = report.title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("Title is required".to_string()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Title must be {MAX_TITLE_LENGTH} characters or less"
        )));
    }
    if report.description.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Description is required".to_string(),
        ));
    }
    if report.description.len() > MAX_TEXT_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Description must be {MAX_TEXT_LENGTH} characters or less"
        )));
    }
    Ok(())
}

#[async_trait]
impl IssueService for SeaOrmIssueService {
    async fn list(
        &self,
        actor: &Actor,
        status: Option<IssueStatus>,
    ) -> Result<Vec<IssueView>, ServiceError> {
        let rows = self.store.issues().list(&actor.scope(), status).await?;

        let computers: HashMap<String, String> = self
            .store
            .computers()
            .labels()
            .await?
            .into_iter()
            .map(|(id, _, name)| (id, name))
            .collect();

        let mut reporters: Vec<String> = rows.iter().map(|i| i.reported_by.clone()).collect();
        reporters.sort_unstable();
        reporters.dedup();
        let names = self.store.profiles().names_for(&reporters).await?;

        Ok(rows
            .into_iter()
            .map(|issue| IssueView {
                computer_name: computers.get(&issue.computer_id).cloned(),
                reporter_name: names.get(&issue.reported_by).cloned(),
                issue,
            })
            .collect())
    }

    async fn get(&self, actor: &Actor, id: &str) -> Result<issues::Model, ServiceError> {
        let issue = self
            .store
            .issues()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Issue {id}")))?;

        if !actor.scope().permits(&issue.reported_by) {
            return Err(ServiceError::not_found(format!("Issue {id}")));
        }
        Ok(issue)
    }

    async fn report(
        &self,
        actor: &Actor,
        report: IssueReport,
    ) -> Result<issues::Model, ServiceError> {
        validate_report(&report)?;

        if !self.store.computers().exists(&report.computer_id).await? {
            return Err(ServiceError::Validation(format!(
                "Unknown computer: {}",
                report.computer_id
            )));
        }

        let issue = self
            .store
            .issues()
            .create(NewIssue {
                computer_id: report.computer_id,
                reported_by: actor.user_id.clone(),
                title: report.title.trim().to_string(),
                description: report.description.trim().to_string(),
                priority: report.priority,
                created_at: clock::now_stamp(),
            })
            .await?;

        info!(
            event = "issue_reported",
            issue_id = %issue.id,
            computer_id = %issue.computer_id,
            priority = %issue.priority,
            "Issue reported"
        );

        let _ = self.event_bus.send(LabEvent::IssueReported {
            issue_id: issue.id.clone(),
            computer_id: issue.computer_id.clone(),
            priority: issue.priority,
        });

        Ok(issue)
    }

    async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        update: IssueStatusUpdate,
    ) -> Result<issues::Model, ServiceError> {
        actor.require_staff()?;

        let issue = self
            .store
            .issues()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Issue {id}")))?;

        if !issue.status.can_transition_to(update.status) {
            return Err(ServiceError::Conflict(format!(
                "Cannot move issue from {} to {}",
                issue.status, update.status
            )));
        }

        let notes = update
            .resolution_notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if notes.as_ref().is_some_and(|n| n.len() > MAX_TEXT_LENGTH) {
            return Err(ServiceError::Validation(format!(
                "Resolution notes must be {MAX_TEXT_LENGTH} characters or less"
            )));
        }

        let resolution = update.status.is_resolution().then(|| Resolution {
            resolved_by: actor.user_id.clone(),
            resolved_at: clock::now_stamp(),
            notes,
        });

        let from = issue.status;
        let updated = self
            .store
            .issues()
            .set_status(issue, update.status, resolution)
            .await?;

        info!(
            event = "issue_status_changed",
            issue_id = %updated.id,
            from = %from,
            to = %updated.status,
            actor_id = %actor.user_id,
            "Issue status changed"
        );

        self.notify_reporter(&updated).await;

        let _ = self.event_bus.send(LabEvent::IssueStatusChanged {
            issue_id: updated.id.clone(),
            status: updated.status,
        });

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssuePriority;

    fn report(title: &str, description: &str) -> IssueReport {
        IssueReport {
            computer_id: "pc-1".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            priority: IssuePriority::default(),
        }
    }

    #[test]
    fn test_validate_report() {
        assert!(validate_report(&report("Monitor flickers", "Every few seconds")).is_ok());
        assert!(validate_report(&report("   ", "body")).is_err());
        assert!(validate_report(&report("title", "")).is_err());
        assert!(validate_report(&report(&"x".repeat(MAX_TITLE_LENGTH + 1), "body")).is_err());
    }
}
