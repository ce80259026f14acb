//! Domain service for the booking lifecycle.
//!
//! Bookings are created `pending` for the caller. Staff move them through
//! `pending -> confirmed | cancelled` and `confirmed -> completed`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::BookingStatus;
use crate::entities::bookings;
use crate::services::ServiceError;
use crate::services::access::Actor;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Computer not found: {0}")]
    ComputerNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Cannot change booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Time slot overlaps {} existing booking(s)", conflicts.len())]
    Overlap { conflicts: Vec<String> },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for BookingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BookingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

impl From<ServiceError> for BookingError {
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
pub struct BookingRequest {
    pub computer_id: String,
    pub start_time: String,
    pub end_time: String,
    pub purpose: Option<String>,
}

/// A booking with the labels a list view needs.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: bookings::Model,
    pub computer_name: Option<String>,
    pub computer_system_id: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingCreated {
    #[serde(flatten)]
    pub booking: bookings::Model,
    /// Ids of active bookings on the same computer whose windows overlap.
    pub conflicts: Vec<String>,
}

#[async_trait::async_trait]
pub trait BookingService: Send + Sync {
    /// Bookings visible to the caller, newest start first.
    async fn list(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingView>, BookingError>;

    async fn get(&self, actor: &Actor, id: &str) -> Result<bookings::Model, BookingError>;

    /// Creates a `pending` booking owned by the caller.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] for unparsable times or `end <= start`
    /// - [`BookingError::ComputerNotFound`] for an unknown computer
    /// - [`BookingError::Overlap`] under the `reject` overlap policy
    async fn create(
        &self,
        actor: &Actor,
        request: BookingRequest,
    ) -> Result<BookingCreated, BookingError>;

    /// Staff-only status change.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidTransition`] for anything outside the state machine.
    async fn transition(
        &self,
        actor: &Actor,
        id: &str,
        to: BookingStatus,
    ) -> Result<bookings::Model, BookingError>;
}
