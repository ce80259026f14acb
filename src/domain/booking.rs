//! Booking state machine and time-slot overlap rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BookingStatus;

/// What happens when a new booking overlaps an active booking on the same computer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Reject the booking with a conflict.
    Reject,
    /// Create the booking and report the overlapping ids back to the caller.
    #[default]
    Warn,
    /// Create the booking and notify every admin/staff member for arbitration.
    StaffReview,
}

/// Returns true when `from -> to` is an allowed booking transition.
///
/// `pending -> confirmed | cancelled`, `confirmed -> completed`. Cancelled and
/// completed are terminal.
#[must_use]
pub const fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    matches!(
        (from, to),
        (BookingStatus::Pending, BookingStatus::Confirmed)
            | (BookingStatus::Pending, BookingStatus::Cancelled)
            | (BookingStatus::Confirmed, BookingStatus::Completed)
    )
}

/// Half-open interval overlap: touching end/start boundaries do not overlap.
#[must_use]
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// A booking window must end strictly after it starts.
pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), String> {
    if end <= start {
        return Err("Booking end time must be after its start time".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_allowed_transitions() {
        use BookingStatus::{Cancelled, Completed, Confirmed, Pending};

        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Confirmed, Completed));

        assert!(!can_transition(Pending, Completed));
        assert!(!can_transition(Confirmed, Pending));
        assert!(!can_transition(Cancelled, Confirmed));
        assert!(!can_transition(Completed, Cancelled));
        assert!(!can_transition(Pending, Pending));
    }

    #[test]
    fn test_overlap_detection() {
        assert!(overlaps(at(10, 0), at(11, 0), at(10, 30), at(11, 30)));
        assert!(overlaps(at(10, 0), at(12, 0), at(10, 30), at(11, 0)));
        assert!(!overlaps(at(10, 0), at(11, 0), at(11, 0), at(12, 0)));
        assert!(!overlaps(at(10, 0), at(11, 0), at(8, 0), at(9, 0)));
    }

    #[test]
    fn test_window_validation() {
        assert!(validate_window(at(10, 0), at(11, 0)).is_ok());
        assert!(validate_window(at(10, 0), at(10, 0)).is_err());
        assert!(validate_window(at(11, 0), at(10, 0)).is_err());
    }

    #[test]
    fn test_policy_parses_from_config_value() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: OverlapPolicy,
        }

        let parsed: Wrapper = toml::from_str(r#"policy = "staff_review""#).unwrap();
        assert_eq!(parsed.policy, OverlapPolicy::StaffReview);
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::Warn);
    }
}
