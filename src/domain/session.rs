//! Session duration and attendance arithmetic.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Whole minutes between login and logout, rounded down.
///
/// A logout earlier than the login (clock skew) yields zero.
#[must_use]
pub fn duration_minutes(login: DateTime<Utc>, logout: DateTime<Utc>) -> i32 {
    let millis = (logout - login).num_milliseconds().max(0);
    i32::try_from(millis / 60_000).unwrap_or(i32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AttendanceStats {
    /// Distinct calendar days (UTC) with at least one login.
    pub total_days: usize,
    /// Total recorded minutes divided by sixty, rounded half away from zero.
    pub total_hours: i64,
    /// Sessions whose login falls in the same month as `now`.
    pub this_month: usize,
}

/// Summarises sessions given as `(login_time, duration_minutes)` pairs.
#[must_use]
pub fn attendance(sessions: &[(DateTime<Utc>, Option<i32>)], now: DateTime<Utc>) -> AttendanceStats {
    let days: HashSet<_> = sessions.iter().map(|(login, _)| login.date_naive()).collect();

    let total_minutes: i64 = sessions
        .iter()
        .map(|(_, minutes)| i64::from(minutes.unwrap_or(0)))
        .sum();

    let this_month = sessions
        .iter()
        .filter(|(login, _)| login.year() == now.year() && login.month() == now.month())
        .count();

    AttendanceStats {
        total_days: days.len(),
        total_hours: round_hours(total_minutes),
        this_month,
    }
}

/// Minutes to hours, rounding half up.
#[must_use]
pub const fn round_hours(minutes: i64) -> i64 {
    (minutes + 30).div_euclid(60)
}
