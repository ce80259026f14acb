use tracing::info;

use crate::db::Store;
use crate::db::repositories::computer::{ComputerChanges, ComputerDeletion, NewComputer};
use crate::domain::{ComputerStatus, clock};
use crate::entities::computers;
use crate::services::ServiceError;
use crate::services::access::Actor;

pub struct ComputerService {
    store: Store,
}

/// Normalises optional date fields and checks the required ones.
pub(crate) fn validate_new_computer(input: &mut NewComputer) -> Result<(), ServiceError> {
    if input.system_id.trim().is_empty() {
        return Err(ServiceError::Validation("system_id is required".to_string()));
    }
    if input.name.trim().is_empty() {
        return Err(ServiceError::Validation("name is required".to_string()));
    }
    normalise_date(&mut input.purchase_date)?;
    normalise_date(&mut input.warranty_expiry)?;
    Ok(())
}

pub(crate) fn normalise_date(value: &mut Option<String>) -> Result<(), ServiceError> {
    *value = match value.take().filter(|v| !v.trim().is_empty()) {
        Some(v) => Some(clock::normalise_date_or_stamp(&v).map_err(ServiceError::Validation)?),
        None => None,
    };
    Ok(())
}

impl ComputerService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        status: Option<ComputerStatus>,
    ) -> Result<Vec<computers::Model>, ServiceError> {
        Ok(self.store.computers().list(status).await?)
    }

    pub async fn get(&self, id: &str) -> Result<computers::Model, ServiceError> {
        self.store
            .computers()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Computer {id}")))
    }

    pub async fn create(
        &self,
        actor: &Actor,
        mut input: NewComputer,
    ) -> Result<computers::Model, ServiceError> {
        actor.require_staff()?;
        validate_new_computer(&mut input)?;

        let repo = self.store.computers();
        if repo.system_id_taken(input.system_id.trim(), None).await? {
            return Err(ServiceError::Conflict(format!(
                "System ID {} is already registered",
                input.system_id.trim()
            )));
        }

        let computer = repo.create(input).await?;
        info!(event = "computer_created", computer_id = %computer.id, system_id = %computer.system_id, "Computer registered");
        Ok(computer)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        mut changes: ComputerChanges,
    ) -> Result<computers::Model, ServiceError> {
        actor.require_staff()?;

        if let Some(system_id) = &changes.system_id {
            if system_id.trim().is_empty() {
                return Err(ServiceError::Validation("system_id cannot be empty".to_string()));
            }
            if self
                .store
                .computers()
                .system_id_taken(system_id.trim(), Some(id))
                .await?
            {
                return Err(ServiceError::Conflict(format!(
                    "System ID {} is already registered",
                    system_id.trim()
                )));
            }
        }
        if changes.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ServiceError::Validation("name cannot be empty".to_string()));
        }
        normalise_date(&mut changes.purchase_date)?;
        normalise_date(&mut changes.warranty_expiry)?;

        let computer = self
            .store
            .computers()
            .update(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Computer {id}")))?;

        info!(event = "computer_updated", computer_id = %computer.id, status = %computer.status, "Computer updated");
        Ok(computer)
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<(), ServiceError> {
        actor.require_staff()?;

        match self.store.computers().delete(id).await? {
            ComputerDeletion::Deleted => {
                info!(event = "computer_deleted", computer_id = %id, "Computer deleted");
                Ok(())
            }
            ComputerDeletion::NotFound => Err(ServiceError::not_found(format!("Computer {id}"))),
            ComputerDeletion::Referenced(tables) => Err(ServiceError::Conflict(format!(
                "Computer is still referenced by {}",
                tables.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_computer_normalises_dates() {
        let mut input = NewComputer {
            system_id: "LAB-01".to_string(),
            name: "Front row".to_string(),
            purchase_date: Some("2024-02-03".to_string()),
            warranty_expiry: Some("  ".to_string()),
            ..NewComputer::default()
        };
        validate_new_computer(&mut input).unwrap();
        assert_eq!(input.purchase_date.as_deref(), Some("2024-02-03"));
        assert_eq!(input.warranty_expiry, None);
    }

    #[test]
    fn test_validate_new_computer_rejects_missing_fields() {
        let mut input = NewComputer {
            name: "No id".to_string(),
            ..NewComputer::default()
        };
        assert!(validate_new_computer(&mut input).is_err());

        let mut bad_date = NewComputer {
            system_id: "LAB-02".to_string(),
            name: "Bad".to_string(),
            purchase_date: Some("yesterday".to_string()),
            ..NewComputer::default()
        };
        assert!(validate_new_computer(&mut bad_date).is_err());
    }
}
