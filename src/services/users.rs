use serde::Serialize;
use tracing::info;

use crate::db::Store;
use crate::db::repositories::profile::ProfileChanges;
use crate::domain::Role;
use crate::entities::profiles;
use crate::services::ServiceError;
use crate::services::access::Actor;

#[derive(Debug, Clone, Serialize)]
pub struct ProfileWithRole {
    #[serde(flatten)]
    pub profile: profiles::Model,
    pub role: Role,
}

pub struct UserService {
    store: Store,
}

impl UserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Staff-only directory of every profile and its role.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<ProfileWithRole>, ServiceError> {
        actor.require_staff()?;
        Ok(self
            .store
            .profiles()
            .list_with_roles()
            .await?
            .into_iter()
            .map(|(profile, role)| ProfileWithRole { profile, role })
            .collect())
    }

    /// Admin-only. The last admin cannot be demoted.
    pub async fn set_role(&self, actor: &Actor, user_id: &str, role: Role) -> Result<(), ServiceError> {
        actor.require_admin()?;

        let users = self.store.users();
        let current = users
            .role_of(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User {user_id}")))?;

        if current == role {
            return Ok(());
        }
        if current == Role::Admin && users.count_with_role(Role::Admin).await? <= 1 {
            return Err(ServiceError::Conflict(
                "The last admin cannot be demoted".to_string(),
            ));
        }

        users.set_role(user_id, role).await?;
        info!(
            event = "role_changed",
            user_id = %user_id,
            from = %current,
            to = %role,
            actor_id = %actor.user_id,
            "User role changed"
        );
        Ok(())
    }

    pub async fn update_own_profile(
        &self,
        actor: &Actor,
        changes: ProfileChanges,
    ) -> Result<profiles::Model, ServiceError> {
        if changes.full_name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ServiceError::Validation("Full name cannot be empty".to_string()));
        }

        self.store
            .profiles()
            .update(&actor.user_id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile"))
    }
}
