//! Domain events for the application.
//!
//! Events are sent over the event bus. The log listener persists them to
//! `system_logs` and the SSE endpoint streams them to connected clients.

use serde::Serialize;

use super::{BookingStatus, IssuePriority, IssueStatus};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum LabEvent {
    BookingCreated {
        booking_id: String,
        computer_id: String,
        user_id: String,
        conflicts: usize,
    },
    BookingStatusChanged {
        booking_id: String,
        status: BookingStatus,
    },

    SessionStarted {
        session_id: String,
        computer_id: String,
        user_id: String,
    },
    SessionEnded {
        session_id: String,
        duration_minutes: i32,
    },

    IssueReported {
        issue_id: String,
        computer_id: String,
        priority: IssuePriority,
    },
    IssueStatusChanged {
        issue_id: String,
        status: IssueStatus,
    },
    IssuesPurged {
        deleted: u64,
    },

    MaintenanceLogged {
        log_id: String,
        computer_id: String,
    },

    NotificationsSent {
        count: usize,
    },

    AccountDeleted {
        user_id: String,
    },

    Error {
        message: String,
    },
    Info {
        message: String,
    },
}

impl LabEvent {
    /// The account an event is about, when it concerns one person.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::BookingCreated { user_id, .. }
            | Self::SessionStarted { user_id, .. }
            | Self::AccountDeleted { user_id } => Some(user_id),
            _ => None,
        }
    }
}
