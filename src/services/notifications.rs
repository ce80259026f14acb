use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::constants::limits::{MAX_TEXT_LENGTH, MAX_TITLE_LENGTH};
use crate::constants::notification_kinds;
use crate::db::Store;
use crate::db::repositories::notification::Message;
use crate::domain::events::LabEvent;
use crate::entities::notifications;
use crate::services::ServiceError;
use crate::services::access::Actor;

/// Recipient value that fans a notification out to every profile.
pub const ALL_RECIPIENTS: &str = "all";

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationDraft {
    /// A user id, or `"all"`.
    pub user_id: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

fn default_kind() -> String {
    notification_kinds::SYSTEM.to_string()
}

pub struct NotificationService {
    store: Store,
    event_bus: broadcast::Sender<LabEvent>,
}

impl NotificationService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<LabEvent>) -> Self {
        Self { store, event_bus }
    }

    pub async fn list(
        &self,
        actor: &Actor,
        unread_only: bool,
    ) -> Result<Vec<notifications::Model>, ServiceError> {
        Ok(self
            .store
            .notifications()
            .list(&actor.scope(), unread_only)
            .await?)
    }

    pub async fn unread_count(&self, actor: &Actor) -> Result<u64, ServiceError> {
        Ok(self.store.notifications().unread_count(&actor.user_id).await?)
    }

    async fn owned(&self, actor: &Actor, id: &str) -> Result<notifications::Model, ServiceError> {
        let notification = self
            .store
            .notifications()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Notification {id}")))?;
        actor.require_owner_or_staff(&notification.user_id)?;
        Ok(notification)
    }

    pub async fn mark_read(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<notifications::Model, ServiceError> {
        let notification = self.owned(actor, id).await?;
        if notification.read {
            return Ok(notification);
        }
        Ok(self.store.notifications().mark_read(notification).await?)
    }

    pub async fn mark_all_read(&self, actor: &Actor) -> Result<u64, ServiceError> {
        Ok(self
            .store
            .notifications()
            .mark_all_read(&actor.user_id)
            .await?)
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<(), ServiceError> {
        self.owned(actor, id).await?;
        self.store.notifications().delete(id).await?;
        Ok(())
    }

    /// Staff-only. Returns the number of rows written.
    pub async fn send(&self, actor: &Actor, draft: NotificationDraft) -> Result<usize, ServiceError> {
        actor.require_staff()?;

        if draft.title.trim().is_empty() || draft.title.len() > MAX_TITLE_LENGTH {
            return Err(ServiceError::Validation(format!(
                "Title is required and must be {MAX_TITLE_LENGTH} characters or less"
            )));
        }
        if draft.message.len() > MAX_TEXT_LENGTH {
            return Err(ServiceError::Validation(format!(
                "Message must be {MAX_TEXT_LENGTH} characters or less"
            )));
        }

        let msg = Message {
            kind: draft.kind.trim().to_lowercase(),
            title: draft.title.trim().to_string(),
            message: draft.message,
            link: draft.link.filter(|l| !l.trim().is_empty()),
        };

        let repo = self.store.notifications();
        let count = if draft.user_id == ALL_RECIPIENTS {
            let everyone = self.store.profiles().all_ids().await?;
            repo.send_many(&everyone, &msg).await?
        } else {
            if self.store.profiles().get(&draft.user_id).await?.is_none() {
                return Err(ServiceError::not_found(format!("User {}", draft.user_id)));
            }
            repo.send(&draft.user_id, &msg).await?;
            1
        };

        info!(event = "notifications_sent", count, kind = %msg.kind, actor_id = %actor.user_id, "Notifications sent");
        let _ = self.event_bus.send(LabEvent::NotificationsSent { count });

        Ok(count)
    }
}
