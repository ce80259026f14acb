//! Dashboard counters and date-range reports.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::constants::limits::TOP_COMPUTERS_BY_USAGE;
use crate::db::Store;
use crate::domain::session::round_hours;
use crate::domain::{BookingStatus, ComputerStatus, IssueStatus, clock};
use crate::services::ServiceError;
use crate::services::access::Actor;

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_computers: u64,
    pub available_computers: u64,
    pub confirmed_bookings: u64,
    pub pending_issues: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_software: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount<S> {
    pub status: S,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputerUsage {
    pub computer_id: String,
    pub computer_name: String,
    pub sessions: i64,
    pub minutes: i64,
    pub hours: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub from: String,
    pub to: String,
    pub bookings_per_day: Vec<DayCount>,
    pub issues_by_status: Vec<StatusCount<IssueStatus>>,
    pub computer_usage: Vec<ComputerUsage>,
    pub computers_by_status: Vec<StatusCount<ComputerStatus>>,
}

/// Resolves an optional `[from, to]` range. Defaults to the last 30 days; a
/// bare `to` date covers that whole day.
pub fn report_range(
    from: Option<&str>,
    to: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(String, String), ServiceError> {
    let to = match to.map(str::trim).filter(|v| !v.is_empty()) {
        None => now,
        Some(v) => match NaiveDate::parse_from_str(v, "%Y-%m-%d") {
            Ok(day) => day
                .and_hms_milli_opt(23, 59, 59, 999)
                .map(|naive| naive.and_utc())
                .ok_or_else(|| ServiceError::Validation(format!("Invalid date: '{v}'")))?,
            Err(_) => clock::parse(v).map_err(ServiceError::Validation)?,
        },
    };

    let from = match from.map(str::trim).filter(|v| !v.is_empty()) {
        None => to - Duration::days(30),
        Some(v) => clock::parse_date_or_stamp(v)
            .ok_or_else(|| ServiceError::Validation(format!("Invalid date: '{v}'")))?,
    };

    if from > to {
        return Err(ServiceError::Validation(
            "Report start must not be after its end".to_string(),
        ));
    }

    Ok((clock::stamp(from), clock::stamp(to)))
}

/// Sums session minutes per computer and keeps the busiest machines.
pub fn usage_by_computer(
    sessions: &[(String, i32)],
    names: &HashMap<String, String>,
    limit: usize,
) -> Vec<ComputerUsage> {
    let mut totals: HashMap<&str, (i64, i64)> = HashMap::new();
    for (computer_id, minutes) in sessions {
        let entry = totals.entry(computer_id.as_str()).or_default();
        entry.0 += 1;
        entry.1 += i64::from(*minutes);
    }

    let mut usage: Vec<ComputerUsage> = totals
        .into_iter()
        .map(|(computer_id, (sessions, minutes))| ComputerUsage {
            computer_id: computer_id.to_string(),
            computer_name: names
                .get(computer_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            sessions,
            minutes,
            hours: round_hours(minutes),
        })
        .collect();

    usage.sort_by(|a, b| {
        b.minutes
            .cmp(&a.minutes)
            .then_with(|| a.computer_name.cmp(&b.computer_name))
    });
    usage.truncate(limit);
    usage
}

pub struct DashboardService {
    store: Store,
}

impl DashboardService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Booking and issue counts are scoped for students; admins also get user
    /// and software totals.
    pub async fn summary(&self, actor: &Actor) -> Result<Summary, ServiceError> {
        let scope = actor.scope();
        let computers = self.store.computers();

        let mut summary = Summary {
            total_computers: computers.count(None).await?,
            available_computers: computers.count(Some(ComputerStatus::Available)).await?,
            confirmed_bookings: self
                .store
                .bookings()
                .count(&scope, Some(BookingStatus::Confirmed))
                .await?,
            pending_issues: self
                .store
                .issues()
                .count(&scope, Some(IssueStatus::Pending))
                .await?,
            total_users: None,
            total_software: None,
        };

        if actor.is_admin() {
            summary.total_users = Some(self.store.profiles().count().await?);
            summary.total_software = Some(self.store.software().count().await?);
        }

        Ok(summary)
    }

    pub async fn report(
        &self,
        actor: &Actor,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Report, ServiceError> {
        actor.require_staff()?;
        let (from, to) = report_range(from, to, Utc::now())?;

        let bookings_per_day = self
            .store
            .bookings()
            .count_per_day(&from, &to)
            .await?
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect();

        let issues_by_status = self
            .store
            .issues()
            .count_by_status(&from, &to)
            .await?
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();

        let names: HashMap<String, String> = self
            .store
            .computers()
            .labels()
            .await?
            .into_iter()
            .map(|(id, _, name)| (id, name))
            .collect();
        let sessions = self.store.sessions().durations_between(&from, &to).await?;

        let computers_by_status = self
            .store
            .computers()
            .count_by_status()
            .await?
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();

        Ok(Report {
            computer_usage: usage_by_computer(&sessions, &names, TOP_COMPUTERS_BY_USAGE),
            from,
            to,
            bookings_per_day,
            issues_by_status,
            computers_by_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_range_defaults_to_last_30_days() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let (from, to) = report_range(None, None, now).unwrap();
        assert_eq!(from, "2024-05-31T12:00:00.000Z");
        assert_eq!(to, "2024-06-30T12:00:00.000Z");
    }

    #[test]
    fn test_report_range_dates_cover_whole_days() {
        let now = Utc::now();
        let (from, to) = report_range(Some("2024-06-01"), Some("2024-06-07"), now).unwrap();
        assert_eq!(from, "2024-06-01T00:00:00.000Z");
        assert_eq!(to, "2024-06-07T23:59:59.999Z");

        assert!(report_range(Some("2024-06-08"), Some("2024-06-07"), now).is_err());
        assert!(report_range(Some("june"), None, now).is_err());
    }

    #[test]
    fn test_usage_by_computer() {
        let names: HashMap<String, String> = [
            ("a".to_string(), "Alpha".to_string()),
            ("b".to_string(), "Bravo".to_string()),
        ]
        .into_iter()
        .collect();
        let sessions = vec![
            ("a".to_string(), 45),
            ("b".to_string(), 100),
            ("a".to_string(), 50),
            ("c".to_string(), 10),
        ];

        let usage = usage_by_computer(&sessions, &names, 2);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].computer_name, "Bravo");
        assert_eq!(usage[0].hours, 2);
        assert_eq!(usage[1].computer_id, "a");
        assert_eq!(usage[1].sessions, 2);
        assert_eq!(usage[1].minutes, 95);
        assert_eq!(usage[1].hours, 2);
    }
}
