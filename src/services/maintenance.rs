use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::constants::MAINTENANCE_TYPES;
use crate::constants::limits::MAX_TEXT_LENGTH;
use crate::db::Store;
use crate::db::repositories::maintenance::NewMaintenance;
use crate::domain::clock;
use crate::domain::events::LabEvent;
use crate::entities::maintenance_logs;
use crate::services::ServiceError;
use crate::services::access::Actor;

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceView {
    #[serde(flatten)]
    pub log: maintenance_logs::Model,
    pub computer_name: Option<String>,
    pub performer_name: Option<String>,
}

pub struct MaintenanceService {
    store: Store,
    event_bus: broadcast::Sender<LabEvent>,
}

fn normalise_stamp(value: &mut Option<String>) -> Result<(), ServiceError> {
    *value = match value.take().filter(|v| !v.trim().is_empty()) {
        Some(v) => Some(
            clock::parse(&v)
                .map(clock::stamp)
                .map_err(ServiceError::Validation)?,
        ),
        None => None,
    };
    Ok(())
}

fn validate(input: &mut NewMaintenance) -> Result<(), ServiceError> {
    if !MAINTENANCE_TYPES.contains(&input.maintenance_type.as_str()) {
        return Err(ServiceError::Validation(format!(
            "Unknown maintenance type '{}', expected one of: {}",
            input.maintenance_type,
            MAINTENANCE_TYPES.join(", ")
        )));
    }
    if input.description.trim().is_empty() {
        return Err(ServiceError::Validation(
            "Description is required".to_string(),
        ));
    }
    if input.description.len() > MAX_TEXT_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Description must be {MAX_TEXT_LENGTH} characters or less"
        )));
    }
    if input.cost.is_some_and(|c| !c.is_finite() || c < 0.0) {
        return Err(ServiceError::Validation(
            "Cost must be a non-negative number".to_string(),
        ));
    }
    normalise_stamp(&mut input.started_at)?;
    normalise_stamp(&mut input.completed_at)?;
    if let (Some(started), Some(completed)) = (&input.started_at, &input.completed_at) {
        if completed < started {
            return Err(ServiceError::Validation(
                "completed_at cannot be before started_at".to_string(),
            ));
        }
    }
    Ok(())
}

impl MaintenanceService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<LabEvent>) -> Self {
        Self { store, event_bus }
    }

    pub async fn list(
        &self,
        actor: &Actor,
        computer_id: Option<&str>,
    ) -> Result<Vec<MaintenanceView>, ServiceError> {
        actor.require_staff()?;

        let rows = self.store.maintenance().list(computer_id).await?;

        let computers: HashMap<String, String> = self
            .store
            .computers()
            .labels()
            .await?
            .into_iter()
            .map(|(id, _, name)| (id, name))
            .collect();

        let mut performers: Vec<String> = rows.iter().map(|m| m.performed_by.clone()).collect();
        performers.sort_unstable();
        performers.dedup();
        let names = self.store.profiles().names_for(&performers).await?;

        Ok(rows
            .into_iter()
            .map(|log| MaintenanceView {
                computer_name: computers.get(&log.computer_id).cloned(),
                performer_name: names.get(&log.performed_by).cloned(),
                log,
            })
            .collect())
    }

    pub async fn create(
        &self,
        actor: &Actor,
        mut input: NewMaintenance,
    ) -> Result<maintenance_logs::Model, ServiceError> {
        actor.require_staff()?;
        validate(&mut input)?;

        if !self.store.computers().exists(&input.computer_id).await? {
            return Err(ServiceError::Validation(format!(
                "Unknown computer: {}",
                input.computer_id
            )));
        }

        let log = self
            .store
            .maintenance()
            .create(input, &actor.user_id)
            .await?;

        info!(
            event = "maintenance_logged",
            log_id = %log.id,
            computer_id = %log.computer_id,
            maintenance_type = %log.maintenance_type,
            "Maintenance logged"
        );

        let _ = self.event_bus.send(LabEvent::MaintenanceLogged {
            log_id: log.id.clone(),
            computer_id: log.computer_id.clone(),
        });

        Ok(log)
    }

    pub async fn complete(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<maintenance_logs::Model, ServiceError> {
        actor.require_staff()?;

        let repo = self.store.maintenance();
        let log = repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Maintenance log {id}")))?;

        if log.completed_at.is_some() {
            return Err(ServiceError::Conflict(
                "Maintenance is already completed".to_string(),
            ));
        }

        Ok(repo.complete(log, &clock::now_stamp()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kind: &str) -> NewMaintenance {
        NewMaintenance {
            computer_id: "pc-1".to_string(),
            maintenance_type: kind.to_string(),
            description: "Replaced thermal paste".to_string(),
            ..NewMaintenance::default()
        }
    }

    #[test]
    fn test_validate_maintenance_type() {
        assert!(validate(&mut input("Preventive")).is_ok());
        assert!(validate(&mut input("Hardware Upgrade")).is_ok());
        assert!(validate(&mut input("preventive")).is_err());
        assert!(validate(&mut input("Overclocking")).is_err());
    }

    #[test]
    fn test_validate_completion_order() {
        let mut backwards = input("Repair");
        backwards.started_at = Some("2024-05-02T10:00:00Z".to_string());
        backwards.completed_at = Some("2024-05-01T10:00:00Z".to_string());
        assert!(validate(&mut backwards).is_err());

        let mut ok = input("Repair");
        ok.started_at = Some("2024-05-01T10:00".to_string());
        ok.completed_at = Some("2024-05-01T12:30:00+02:00".to_string());
        validate(&mut ok).unwrap();
        assert_eq!(ok.started_at.as_deref(), Some("2024-05-01T10:00:00.000Z"));
        assert_eq!(ok.completed_at.as_deref(), Some("2024-05-01T10:30:00.000Z"));
    }

    #[test]
    fn test_validate_rejects_negative_cost() {
        let mut negative = input("Cleaning");
        negative.cost = Some(-5.0);
        assert!(validate(&mut negative).is_err());
    }
}
