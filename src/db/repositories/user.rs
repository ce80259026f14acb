use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Serialize;
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::{Role, clock};
use crate::entities::{
    bookings, issues, notifications, prelude::*, profiles, session_logs, user_roles, users,
};

/// Identity data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub api_key: String,
    pub must_change_password: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            api_key: model.api_key,
            must_change_password: model.must_change_password,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub role: Role,
}

/// Rows removed by an account deletion, per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletedRows {
    pub notifications: u64,
    pub bookings: u64,
    pub session_logs: u64,
    pub issues: u64,
    pub profiles: u64,
    pub user_roles: u64,
    pub users: u64,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates the identity, its profile and its role row together.
    pub async fn create(&self, account: NewAccount<'_>, config: &SecurityConfig) -> Result<User> {
        let password = account.password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let id = uuid::Uuid::new_v4().to_string();
        let now = clock::now_stamp();
        let email = account.email.trim().to_lowercase();

        let txn = self.conn.begin().await?;

        let user = users::ActiveModel {
            id: Set(id.clone()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            api_key: Set(generate_api_key()),
            must_change_password: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        }
        .insert(&txn)
        .await
        .context("Failed to insert user")?;

        profiles::ActiveModel {
            id: Set(id.clone()),
            email: Set(email),
            full_name: Set(account.full_name.trim().to_string()),
            student_id: Set(account.student_id),
            department: Set(account.department),
            phone: Set(None),
            avatar_url: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        }
        .insert(&txn)
        .await
        .context("Failed to insert profile")?;

        user_roles::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(id),
            role: Set(account.role),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .context("Failed to insert role")?;

        txn.commit().await?;

        Ok(User::from(user))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .count(&self.conn)
            .await
            .context("Failed to query user by email")?;
        Ok(count > 0)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .all(&self.conn)
            .await
            .context("Failed to list users")?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Verify a password, returning the user when it matches.
    ///
    /// Argon2 is CPU-bound, so verification runs on the blocking pool.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    pub async fn update_password(
        &self,
        user_id: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.must_change_password = Set(false);
        active.updated_at = Set(clock::now_stamp());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")?;

        Ok(user.map(User::from))
    }

    pub async fn regenerate_api_key(&self, user_id: &str) -> Result<String> {
        let user = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for API key regeneration")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let new_api_key = generate_api_key();

        let mut active: users::ActiveModel = user.into();
        active.api_key = Set(new_api_key.clone());
        active.updated_at = Set(clock::now_stamp());
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }

    pub async fn role_of(&self, user_id: &str) -> Result<Option<Role>> {
        let row = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query user role")?;
        Ok(row.map(|r| r.role))
    }

    pub async fn has_role(&self, user_id: &str, role: Role) -> Result<bool> {
        Ok(self.role_of(user_id).await? == Some(role))
    }

    pub async fn is_admin_or_staff(&self, user_id: &str) -> Result<bool> {
        Ok(self
            .role_of(user_id)
            .await?
            .is_some_and(Role::is_admin_or_staff))
    }

    /// Returns false when the user has no role row.
    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<bool> {
        let Some(row) = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query user role")?
        else {
            return Ok(false);
        };

        let mut active: user_roles::ActiveModel = row.into();
        active.role = Set(role);
        active.update(&self.conn).await?;
        Ok(true)
    }

    pub async fn count_with_role(&self, role: Role) -> Result<u64> {
        UserRoles::find()
            .filter(user_roles::Column::Role.eq(role))
            .count(&self.conn)
            .await
            .context("Failed to count roles")
    }

    /// Deletes everything owned by the user in one transaction.
    pub async fn delete_account(&self, user_id: &str) -> Result<DeletedRows> {
        let txn = self.conn.begin().await?;

        let notifications = Notifications::delete_many()
            .filter(notifications::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;
        let bookings = Bookings::delete_many()
            .filter(bookings::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;
        let session_logs = SessionLogs::delete_many()
            .filter(session_logs::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;
        let issues = Issues::delete_many()
            .filter(issues::Column::ReportedBy.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;
        let profiles = Profiles::delete_by_id(user_id)
            .exec(&txn)
            .await?
            .rows_affected;
        let user_roles = UserRoles::delete_many()
            .filter(user_roles::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;
        let users = Users::delete_by_id(user_id).exec(&txn).await?.rows_affected;

        txn.commit()
            .await
            .context("Failed to commit account deletion")?;

        Ok(DeletedRows {
            notifications,
            bookings,
            session_logs,
            issues,
            profiles,
            user_roles,
            users,
        })
    }
}

/// Hash a password using Argon2id with optional custom params.
/// Without a config the crate defaults are used.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_64_hex_chars() {
        let key = generate_api_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_hash_password_verifies() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        };
        let hash = hash_password("hunter22", Some(&config)).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"hunter22", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong", &parsed)
                .is_err()
        );
    }
}
