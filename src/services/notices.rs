use tracing::info;

use crate::constants::limits::{MAX_TEXT_LENGTH, MAX_TITLE_LENGTH};
use crate::db::Store;
use crate::db::repositories::notice::{NewNotice, NoticeChanges};
use crate::domain::clock;
use crate::entities::lab_notices;
use crate::services::ServiceError;
use crate::services::access::Actor;

pub struct NoticeService {
    store: Store,
}

fn check_title(title: &str) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("Title is required".to_string()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Title must be {MAX_TITLE_LENGTH} characters or less"
        )));
    }
    Ok(())
}

fn check_content(content: &str) -> Result<(), ServiceError> {
    if content.len() > MAX_TEXT_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Content must be {MAX_TEXT_LENGTH} characters or less"
        )));
    }
    Ok(())
}

fn normalise_expiry(value: Option<String>) -> Result<Option<String>, ServiceError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            clock::parse(&v)
                .map(clock::stamp)
                .map_err(ServiceError::Validation)
        })
        .transpose()
}

impl NoticeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Staff see every notice; everyone else only active, unexpired ones.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<lab_notices::Model>, ServiceError> {
        let now = clock::now_stamp();
        let visible_at = (!actor.is_staff()).then_some(now.as_str());
        Ok(self.store.notices().list(visible_at).await?)
    }

    pub async fn create(
        &self,
        actor: &Actor,
        mut input: NewNotice,
    ) -> Result<lab_notices::Model, ServiceError> {
        actor.require_staff()?;
        check_title(&input.title)?;
        check_content(&input.content)?;
        input.expires_at = normalise_expiry(input.expires_at)?;

        let notice = self.store.notices().create(input, &actor.user_id).await?;
        info!(event = "notice_created", notice_id = %notice.id, priority = %notice.priority, "Notice posted");
        Ok(notice)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        mut changes: NoticeChanges,
    ) -> Result<lab_notices::Model, ServiceError> {
        actor.require_staff()?;
        if let Some(title) = &changes.title {
            check_title(title)?;
        }
        if let Some(content) = &changes.content {
            check_content(content)?;
        }
        if let Some(expiry) = changes.expires_at.take() {
            changes.expires_at = Some(normalise_expiry(expiry)?);
        }

        self.store
            .notices()
            .update(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Notice {id}")))
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<(), ServiceError> {
        actor.require_staff()?;
        if self.store.notices().delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found(format!("Notice {id}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_expiry() {
        assert_eq!(normalise_expiry(None).unwrap(), None);
        assert_eq!(normalise_expiry(Some(String::new())).unwrap(), None);
        assert_eq!(
            normalise_expiry(Some("2024-06-01T08:00".to_string())).unwrap(),
            Some("2024-06-01T08:00:00.000Z".to_string())
        );
        assert!(normalise_expiry(Some("next week".to_string())).is_err());
    }
}
