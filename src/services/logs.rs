use crate::db::Store;
use crate::domain::events::LabEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::error;

/// Persists every bus event to `system_logs`.
pub struct LogService {
    store: Store,
    event_bus: broadcast::Sender<LabEvent>,
}

type LogEntry = (&'static str, &'static str, String);

fn describe(event: &LabEvent) -> LogEntry {
    match event {
        LabEvent::BookingCreated { conflicts, .. } if *conflicts > 0 => (
            "BookingCreated",
            "warn",
            format!("Booking created with {conflicts} overlapping booking(s)"),
        ),
        LabEvent::BookingCreated { .. } => ("BookingCreated", "info", "Booking created".to_string()),
        LabEvent::BookingStatusChanged { status, .. } => (
            "BookingStatusChanged",
            "info",
            format!("Booking marked {status}"),
        ),
        LabEvent::SessionStarted { .. } => ("SessionStarted", "info", "Session started".to_string()),
        LabEvent::SessionEnded {
            duration_minutes, ..
        } => (
            "SessionEnded",
            "info",
            format!("Session ended after {duration_minutes} minute(s)"),
        ),
        LabEvent::IssueReported { priority, .. } => (
            "IssueReported",
            "info",
            format!("Issue reported with {priority} priority"),
        ),
        LabEvent::IssueStatusChanged { status, .. } => (
            "IssueStatusChanged",
            if status.is_resolution() { "success" } else { "info" },
            format!("Issue marked {status}"),
        ),
        LabEvent::IssuesPurged { deleted } => (
            "IssuesPurged",
            "info",
            format!("Cleanup deleted {deleted} old issue(s)"),
        ),
        LabEvent::MaintenanceLogged { .. } => (
            "MaintenanceLogged",
            "info",
            "Maintenance logged".to_string(),
        ),
        LabEvent::NotificationsSent { count } => (
            "NotificationsSent",
            "info",
            format!("{count} notification(s) sent"),
        ),
        LabEvent::AccountDeleted { .. } => ("AccountDeleted", "warn", "Account deleted".to_string()),
        LabEvent::Error { message } => ("Error", "error", message.clone()),
        LabEvent::Info { message } => ("Info", "info", message.clone()),
    }
}

impl LogService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<LabEvent>) -> Self {
        Self { store, event_bus }
    }

    pub fn start_listener(self: Arc<Self>) {
        let mut rx = self.event_bus.subscribe();
        let service = self;

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = service.handle_event(&event).await {
                            error!(error = %e, "Failed to save log");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        error!(count, "Log listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Log listener event bus closed");
                        break;
                    }
                }
            }
        });
    }

    async fn handle_event(&self, event: &LabEvent) -> anyhow::Result<()> {
        let (event_type, level, message) = describe(event);
        let details = match event {
            LabEvent::Error { .. } | LabEvent::Info { .. } => None,
            _ => Some(serde_json::to_string(event)?),
        };

        self.store
            .add_log(event_type, level, &message, details)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IssueStatus;

    #[test]
    fn test_describe_levels() {
        let overlap = LabEvent::BookingCreated {
            booking_id: "b".to_string(),
            computer_id: "c".to_string(),
            user_id: "u".to_string(),
            conflicts: 2,
        };
        assert_eq!(describe(&overlap).1, "warn");

        let resolved = LabEvent::IssueStatusChanged {
            issue_id: "i".to_string(),
            status: IssueStatus::Resolved,
        };
        let (kind, level, message) = describe(&resolved);
        assert_eq!(kind, "IssueStatusChanged");
        assert_eq!(level, "success");
        assert_eq!(message, "Issue marked resolved");
    }
}
