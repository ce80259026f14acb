//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::{RwLock, broadcast};
use tracing::info;

use crate::config::Config;
use crate::constants::limits::MIN_PASSWORD_LENGTH;
use crate::db::{DeletedRows, NewAccount, Store, User};
use crate::domain::Role;
use crate::domain::events::LabEvent;
use crate::services::access::Actor;
use crate::services::auth_service::{AuthError, AuthService, LoginResult, Registration, UserInfo};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"))
}

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if email_regex().is_match(email.trim()) {
        Ok(())
    } else {
        Err(AuthError::Validation(format!("Invalid email address: '{email}'")))
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<RwLock<Config>>,
    event_bus: broadcast::Sender<LabEvent>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<LabEvent>,
    ) -> Self {
        Self {
            store,
            config,
            event_bus,
        }
    }

    async fn login_result(&self, user: User) -> Result<LoginResult, AuthError> {
        let role = self
            .store
            .users()
            .role_of(&user.id)
            .await?
            .unwrap_or(Role::Student);

        Ok(LoginResult {
            user_id: user.id,
            email: user.email,
            role,
            api_key: user.api_key,
            must_change_password: user.must_change_password,
        })
    }

    async fn actor_from(&self, user: Option<User>) -> Result<Option<Actor>, AuthError> {
        let Some(user) = user else {
            return Ok(None);
        };
        let role = self
            .store
            .users()
            .role_of(&user.id)
            .await?
            .unwrap_or(Role::Student);
        Ok(Some(Actor::new(user.id, user.email, role)))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<LoginResult, AuthError> {
        if !self.config.read().await.security.allow_self_registration {
            return Err(AuthError::Forbidden(
                "Self-registration is disabled".to_string(),
            ));
        }

        self.create_account(registration, Role::Student).await
    }

    async fn create_account(
        &self,
        registration: Registration,
        role: Role,
    ) -> Result<LoginResult, AuthError> {
        validate_email(&registration.email)?;
        validate_password(&registration.password)?;
        if registration.full_name.trim().is_empty() {
            return Err(AuthError::Validation("Full name is required".to_string()));
        }

        let users = self.store.users();
        if users.email_exists(&registration.email).await? {
            return Err(AuthError::Conflict(format!(
                "An account already exists for {}",
                registration.email.trim()
            )));
        }

        let security = self.config.read().await.security.clone();
        let user = users
            .create(
                NewAccount {
                    email: &registration.email,
                    password: &registration.password,
                    full_name: &registration.full_name,
                    student_id: registration.student_id,
                    department: registration.department,
                    role,
                },
                &security,
            )
            .await?;

        info!(event = "account_created", user_id = %user.id, role = %role, "Account created");

        Ok(LoginResult {
            user_id: user.id,
            email: user.email,
            role,
            api_key: user.api_key,
            must_change_password: user.must_change_password,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .users()
            .verify_password(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.login_result(user).await
    }

    async fn actor_for_api_key(&self, api_key: &str) -> Result<Option<Actor>, AuthError> {
        let user = self.store.users().verify_api_key(api_key).await?;
        self.actor_from(user).await
    }

    async fn actor_for_user(&self, user_id: &str) -> Result<Option<Actor>, AuthError> {
        let user = self.store.users().get_by_id(user_id).await?;
        self.actor_from(user).await
    }

    async fn get_user_info(&self, user_id: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let role = self
            .store
            .users()
            .role_of(user_id)
            .await?
            .unwrap_or(Role::Student);
        let profile = self.store.profiles().get(user_id).await?;

        Ok(UserInfo {
            id: user.id,
            email: user.email,
            role,
            must_change_password: user.must_change_password,
            profile,
            created_at: user.created_at,
        })
    }

    async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password).map_err(|_| {
            AuthError::Validation(format!(
                "New password must be at least {MIN_PASSWORD_LENGTH} characters"
            ))
        })?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let users = self.store.users();
        let user = users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if users
            .verify_password(&user.email, current_password)
            .await?
            .is_none()
        {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let security = self.config.read().await.security.clone();
        users
            .update_password(user_id, new_password, &security)
            .await?;

        info!(event = "password_changed", user_id = %user_id, "Password changed");
        Ok(())
    }

    async fn get_api_key(&self, user_id: &str) -> Result<String, AuthError> {
        let user = self
            .store
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.api_key)
    }

    async fn regenerate_api_key(&self, user_id: &str) -> Result<String, AuthError> {
        let new_api_key = self.store.users().regenerate_api_key(user_id).await?;
        info!(event = "api_key_regenerated", user_id = %user_id, "API key regenerated");
        Ok(new_api_key)
    }

    async fn delete_account(&self, actor: &Actor) -> Result<DeletedRows, AuthError> {
        let users = self.store.users();

        if actor.is_admin() && users.count_with_role(Role::Admin).await? <= 1 {
            return Err(AuthError::Conflict(
                "The last admin account cannot be deleted".to_string(),
            ));
        }

        let deleted = users.delete_account(&actor.user_id).await?;
        if deleted.users == 0 {
            return Err(AuthError::UserNotFound);
        }

        info!(
            event = "account_deleted",
            user_id = %actor.user_id,
            bookings = deleted.bookings,
            issues = deleted.issues,
            "Account deleted"
        );

        let _ = self.event_bus.send(LabEvent::AccountDeleted {
            user_id: actor.user_id.clone(),
        });

        Ok(deleted)
    }
}
