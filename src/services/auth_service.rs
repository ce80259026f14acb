//! Domain service for authentication and account management.
//!
//! Handles registration, login, caller resolution, password changes, API keys
//! and atomic account deletion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DeletedRows;
use crate::domain::Role;
use crate::entities::profiles;
use crate::services::access::Actor;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub student_id: Option<String>,
    pub department: Option<String>,
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub must_change_password: bool,
    pub profile: Option<profiles::Model>,
    pub created_at: String,
}

/// Login result containing identity and API key.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub api_key: String,
    pub must_change_password: bool,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a student account with its profile and role.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Forbidden`] when self-registration is disabled
    /// - [`AuthError::Validation`] for a malformed email or short password
    /// - [`AuthError::Conflict`] when the email is already registered
    async fn register(&self, registration: Registration) -> Result<LoginResult, AuthError>;

    /// Creates an account with an explicit role. Used by the CLI.
    async fn create_account(
        &self,
        registration: Registration,
        role: Role,
    ) -> Result<LoginResult, AuthError>;

    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves an API key to the caller, if the key is known.
    async fn actor_for_api_key(&self, api_key: &str) -> Result<Option<Actor>, AuthError>;

    /// Resolves a session user id to the caller, if the user still exists.
    async fn actor_for_user(&self, user_id: &str) -> Result<Option<Actor>, AuthError>;

    async fn get_user_info(&self, user_id: &str) -> Result<UserInfo, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if current password is incorrect or new password invalid.
    async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn get_api_key(&self, user_id: &str) -> Result<String, AuthError>;

    async fn regenerate_api_key(&self, user_id: &str) -> Result<String, AuthError>;

    /// Deletes the caller's account and everything it owns in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the caller is the last admin.
    async fn delete_account(&self, actor: &Actor) -> Result<DeletedRows, AuthError>;
}
