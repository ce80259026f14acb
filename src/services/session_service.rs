//! Domain service for lab session logging and attendance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::session::AttendanceStats;
use crate::entities::session_logs;
use crate::services::ServiceError;
use crate::services::access::Actor;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Session {0} has already ended")]
    AlreadyEnded(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for SessionError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

impl From<ServiceError> for SessionError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(msg) => Self::Forbidden(msg),
            ServiceError::Validation(msg) => Self::Validation(msg),
            ServiceError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Database(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartSession {
    pub computer_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: session_logs::Model,
    pub computer_name: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attendance {
    pub user_id: String,
    #[serde(flatten)]
    pub stats: AttendanceStats,
    pub sessions: Vec<session_logs::Model>,
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Sessions visible to the caller, newest login first.
    async fn list(
        &self,
        actor: &Actor,
        user_id: Option<&str>,
    ) -> Result<Vec<SessionView>, SessionError>;

    /// Staff-only. Opens a session with `login_time = now`.
    async fn start(
        &self,
        actor: &Actor,
        request: StartSession,
    ) -> Result<session_logs::Model, SessionError>;

    /// Staff-only. Sets logout time and duration together.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyEnded`] if the session was already closed.
    async fn end(&self, actor: &Actor, id: &str) -> Result<session_logs::Model, SessionError>;

    /// Attendance summary for one user. Students may only ask about themselves.
    async fn attendance(&self, actor: &Actor, user_id: &str) -> Result<Attendance, SessionError>;
}
