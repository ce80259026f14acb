use serde::Serialize;
use tracing::info;

use crate::db::Store;
use crate::db::repositories::software::{NewSoftware, SoftwareChanges};
use crate::entities::{computer_software, software};
use crate::services::ServiceError;
use crate::services::access::Actor;
use crate::services::computers::normalise_date;

#[derive(Debug, Clone, Serialize)]
pub struct SoftwareWithInstalls {
    #[serde(flatten)]
    pub software: software::Model,
    pub installations: i64,
}

pub struct SoftwareService {
    store: Store,
}

pub(crate) fn validate_new_software(input: &mut NewSoftware) -> Result<(), ServiceError> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::Validation("name is required".to_string()));
    }
    normalise_date(&mut input.license_expiry)
}

impl SoftwareService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<SoftwareWithInstalls>, ServiceError> {
        Ok(self
            .store
            .software()
            .list_with_counts()
            .await?
            .into_iter()
            .map(|(software, installations)| SoftwareWithInstalls {
                software,
                installations,
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<software::Model, ServiceError> {
        self.store
            .software()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Software {id}")))
    }

    pub async fn create(
        &self,
        actor: &Actor,
        mut input: NewSoftware,
    ) -> Result<software::Model, ServiceError> {
        actor.require_staff()?;
        validate_new_software(&mut input)?;

        let package = self.store.software().create(input).await?;
        info!(event = "software_created", software_id = %package.id, name = %package.name, "Software added");
        Ok(package)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        mut changes: SoftwareChanges,
    ) -> Result<software::Model, ServiceError> {
        actor.require_staff()?;
        if changes.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ServiceError::Validation("name cannot be empty".to_string()));
        }
        normalise_date(&mut changes.license_expiry)?;

        self.store
            .software()
            .update(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Software {id}")))
    }

    /// Returns the number of installations removed with the package.
    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<u64, ServiceError> {
        actor.require_staff()?;

        let installs = self
            .store
            .software()
            .delete(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Software {id}")))?;

        info!(event = "software_deleted", software_id = %id, installations = installs, "Software deleted");
        Ok(installs)
    }

    pub async fn installations(
        &self,
        software_id: &str,
    ) -> Result<Vec<computer_software::Model>, ServiceError> {
        self.get(software_id).await?;
        Ok(self.store.software().installations(software_id).await?)
    }

    pub async fn assign(
        &self,
        actor: &Actor,
        software_id: &str,
        computer_id: &str,
    ) -> Result<computer_software::Model, ServiceError> {
        actor.require_staff()?;

        self.get(software_id).await?;
        if !self.store.computers().exists(computer_id).await? {
            return Err(ServiceError::not_found(format!("Computer {computer_id}")));
        }

        let repo = self.store.software();
        if repo.is_installed(computer_id, software_id).await? {
            return Err(ServiceError::Conflict(
                "Software is already installed on this computer".to_string(),
            ));
        }

        Ok(repo.install(computer_id, software_id).await?)
    }

    pub async fn unassign(
        &self,
        actor: &Actor,
        software_id: &str,
        computer_id: &str,
    ) -> Result<(), ServiceError> {
        actor.require_staff()?;

        if self.store.software().uninstall(computer_id, software_id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("Installation"))
        }
    }
}
