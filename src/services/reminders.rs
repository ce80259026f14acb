//! Upcoming bookings, expiring licenses and overdue maintenance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::domain::{BookingStatus, ComputerStatus, Urgency, clock};
use crate::entities::{computers, software};
use crate::services::ServiceError;
use crate::services::access::Actor;

#[derive(Debug, Clone, Serialize)]
pub struct BookingReminder {
    pub id: String,
    pub computer_name: String,
    pub start_time: String,
    pub end_time: String,
    pub purpose: Option<String>,
    pub status: BookingStatus,
    pub hours_until: i64,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize)]
pub struct LicenseReminder {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub license_expiry: String,
    pub days_until: i64,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceReminder {
    pub computer_id: String,
    pub computer_name: String,
    pub status: ComputerStatus,
    pub last_maintenance: Option<String>,
    pub days_since_last_maintenance: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Reminders {
    pub bookings: Vec<BookingReminder>,
    pub licenses: Vec<LicenseReminder>,
    pub maintenance: Vec<MaintenanceReminder>,
}

pub struct ReminderService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

pub(crate) fn license_reminders(packages: Vec<software::Model>, now: DateTime<Utc>) -> Vec<LicenseReminder> {
    packages
        .into_iter()
        .filter_map(|sw| {
            let expiry = sw.license_expiry?;
            let days_until = (clock::parse_date_or_stamp(&expiry)? - now).num_days();
            Some(LicenseReminder {
                id: sw.id,
                name: sw.name,
                vendor: sw.vendor.unwrap_or_default(),
                license_expiry: expiry,
                days_until,
                urgency: Urgency::for_days_until(days_until),
            })
        })
        .collect()
}

/// Computers never maintained, or last maintained more than `interval_days` ago.
pub(crate) fn maintenance_due(
    mut computers: Vec<computers::Model>,
    last_completed: &HashMap<String, String>,
    now: DateTime<Utc>,
    interval_days: i64,
) -> Vec<MaintenanceReminder> {
    computers.sort_by(|a, b| a.name.cmp(&b.name));

    computers
        .into_iter()
        .filter_map(|computer| {
            let last = last_completed.get(&computer.id).cloned();
            let days_since = last
                .as_deref()
                .map(|stamp| (now - clock::parse_stored(stamp)).num_days());

            if days_since.is_some_and(|days| days <= interval_days) {
                return None;
            }

            Some(MaintenanceReminder {
                computer_id: computer.id,
                computer_name: computer.name,
                status: computer.status,
                last_maintenance: last,
                days_since_last_maintenance: days_since,
            })
        })
        .collect()
}

impl ReminderService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }

    pub async fn collect(&self, actor: &Actor) -> Result<Reminders, ServiceError> {
        let windows = self.config.read().await.reminders.clone();
        let now = Utc::now();

        let bookings = self.booking_reminders(actor, now, windows.booking_window_hours).await?;
        if !actor.is_staff() {
            return Ok(Reminders {
                bookings,
                ..Reminders::default()
            });
        }

        let license_cutoff = clock::stamp(now + Duration::days(windows.license_window_days));
        let packages = self
            .store
            .software()
            .licenses_expiring_by(&license_cutoff)
            .await?;

        let computers = self.store.computers().list(None).await?;
        let last_completed = self.store.maintenance().last_completed_by_computer().await?;

        Ok(Reminders {
            bookings,
            licenses: license_reminders(packages, now),
            maintenance: maintenance_due(
                computers,
                &last_completed,
                now,
                windows.maintenance_interval_days,
            ),
        })
    }

    async fn booking_reminders(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
        window_hours: i64,
    ) -> Result<Vec<BookingReminder>, ServiceError> {
        let from = clock::stamp(now);
        let to = clock::stamp(now + Duration::hours(window_hours));

        let upcoming = self
            .store
            .bookings()
            .starting_between(&actor.scope(), &from, &to)
            .await?;

        let names: HashMap<String, String> = self
            .store
            .computers()
            .labels()
            .await?
            .into_iter()
            .map(|(id, _, name)| (id, name))
            .collect();

        Ok(upcoming
            .into_iter()
            .map(|booking| {
                let hours_until = (clock::parse_stored(&booking.start_time) - now).num_hours();
                BookingReminder {
                    computer_name: names
                        .get(&booking.computer_id)
                        .cloned()
                        .unwrap_or_else(|| "Unknown".to_string()),
                    id: booking.id,
                    start_time: booking.start_time,
                    end_time: booking.end_time,
                    purpose: booking.purpose,
                    status: booking.status,
                    hours_until,
                    urgency: Urgency::for_hours_until(hours_until),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn computer(id: &str, name: &str) -> computers::Model {
        computers::Model {
            id: id.to_string(),
            system_id: id.to_uppercase(),
            name: name.to_string(),
            location: None,
            processor: None,
            ram: None,
            storage: None,
            os_version: None,
            purchase_date: None,
            warranty_expiry: None,
            notes: None,
            status: ComputerStatus::Available,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn package(id: &str, expiry: Option<&str>) -> software::Model {
        software::Model {
            id: id.to_string(),
            name: format!("pkg-{id}"),
            version: None,
            vendor: None,
            license_key: None,
            license_expiry: expiry.map(str::to_string),
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_maintenance_due() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let mut last = HashMap::new();
        last.insert("recent".to_string(), "2024-06-20T12:00:00.000Z".to_string());
        last.insert("stale".to_string(), "2024-05-01T12:00:00.000Z".to_string());
        last.insert("edge".to_string(), "2024-05-31T12:00:00.000Z".to_string());

        let due = maintenance_due(
            vec![
                computer("stale", "C"),
                computer("never", "A"),
                computer("recent", "B"),
                computer("edge", "D"),
            ],
            &last,
            now,
            30,
        );

        let ids: Vec<_> = due.iter().map(|r| r.computer_id.as_str()).collect();
        assert_eq!(ids, vec!["never", "stale"]);
        assert_eq!(due[0].days_since_last_maintenance, None);
        assert_eq!(due[1].days_since_last_maintenance, Some(60));
    }

    #[test]
    fn test_license_reminders() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let reminders = license_reminders(
            vec![
                package("expired", Some("2024-05-20")),
                package("soon", Some("2024-06-05")),
                package("later", Some("2024-06-25")),
                package("none", None),
            ],
            now,
        );

        assert_eq!(reminders.len(), 3);
        assert_eq!(reminders[0].urgency, Urgency::Critical);
        assert_eq!(reminders[1].days_until, 4);
        assert_eq!(reminders[1].urgency, Urgency::Warning);
        assert_eq!(reminders[2].urgency, Urgency::Normal);
    }
}
