use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;

use crate::domain::{Role, clock};
use crate::entities::{prelude::*, profiles, user_roles};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

pub struct ProfileRepository {
    conn: DatabaseConnection,
}

impl ProfileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: &str) -> Result<Option<profiles::Model>> {
        Profiles::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query profile")
    }

    /// Profiles with their role, newest first. Users without a role row are
    /// reported as students.
    pub async fn list_with_roles(&self) -> Result<Vec<(profiles::Model, Role)>> {
        let profiles = Profiles::find()
            .order_by_desc(profiles::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list profiles")?;

        let roles: HashMap<String, Role> = UserRoles::find()
            .all(&self.conn)
            .await
            .context("Failed to list roles")?
            .into_iter()
            .map(|r| (r.user_id, r.role))
            .collect();

        Ok(profiles
            .into_iter()
            .map(|p| {
                let role = roles.get(&p.id).copied().unwrap_or(Role::Student);
                (p, role)
            })
            .collect())
    }

    pub async fn update(&self, id: &str, changes: ProfileChanges) -> Result<Option<profiles::Model>> {
        let Some(profile) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: profiles::ActiveModel = profile.into();
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(student_id) = changes.student_id {
            active.student_id = Set(Some(student_id));
        }
        if let Some(department) = changes.department {
            active.department = Set(Some(department));
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(avatar_url) = changes.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        active.updated_at = Set(clock::now_stamp());

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn all_ids(&self) -> Result<Vec<String>> {
        Profiles::find()
            .select_only()
            .column(profiles::Column::Id)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list profile ids")
    }

    /// User ids holding the admin or lab_staff role.
    pub async fn staff_ids(&self) -> Result<Vec<String>> {
        UserRoles::find()
            .select_only()
            .column(user_roles::Column::UserId)
            .filter(user_roles::Column::Role.is_in([Role::Admin, Role::LabStaff]))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list staff ids")
    }

    /// Full names for a batch of ids in a single query.
    pub async fn names_for(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, String)> = Profiles::find()
            .select_only()
            .column(profiles::Column::Id)
            .column(profiles::Column::FullName)
            .filter(profiles::Column::Id.is_in(ids.iter().cloned()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to look up profile names")?;

        Ok(rows.into_iter().collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Profiles::find()
            .count(&self.conn)
            .await
            .context("Failed to count profiles")
    }
}
