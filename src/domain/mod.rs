//! Domain types for the lab with strong typing.
//!
//! Every enumerated column of the schema has a Rust enum here. The enums are
//! sea-orm active enums, so a row can never carry a value outside its set.

pub mod booking;
pub mod clock;
pub mod events;
pub mod session;

use sea_orm::Iterable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role attached to every profile through `user_roles`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "lab_staff")]
    LabStaff,
    #[sea_orm(string_value = "student")]
    Student,
}

impl Role {
    /// Admins and lab staff have unrestricted read/write across all rows.
    #[must_use]
    pub const fn is_admin_or_staff(self) -> bool {
        matches!(self, Self::Admin | Self::LabStaff)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::LabStaff => "lab_staff",
            Self::Student => "student",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ComputerStatus {
    #[default]
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "in_use")]
    InUse,
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
    #[sea_orm(string_value = "retired")]
    Retired,
}

impl ComputerStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::InUse => "in_use",
            Self::Maintenance => "maintenance",
            Self::Retired => "retired",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Bookings that still hold a claim on their time slot.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl IssueStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Issues only move forward: pending < in_progress < resolved < closed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next > self
    }

    /// Whether reaching this status stamps `resolved_at` / `resolved_by`.
    #[must_use]
    pub const fn is_resolution(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum NoticePriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

/// Presentation urgency attached to reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Critical,
    Warning,
    Normal,
}

impl Urgency {
    /// Booking reminders: one hour or less is critical, six hours or less a warning.
    #[must_use]
    pub const fn for_hours_until(hours: i64) -> Self {
        if hours <= 1 {
            Self::Critical
        } else if hours <= 6 {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    /// License reminders: expired is critical, a week or less a warning.
    #[must_use]
    pub const fn for_days_until(days: i64) -> Self {
        if days <= 0 {
            Self::Critical
        } else if days <= 7 {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

macro_rules! impl_display_from_str {
    ($ty:ty, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_value())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::iter()
                    .find(|v| v.to_value() == s.trim())
                    .ok_or_else(|| format!("Invalid {}: '{}'", $label, s))
            }
        }
    };
}

impl_display_from_str!(Role, "role");
impl_display_from_str!(ComputerStatus, "computer status");
impl_display_from_str!(BookingStatus, "booking status");
impl_display_from_str!(IssueStatus, "issue status");
impl_display_from_str!(IssuePriority, "issue priority");
impl_display_from_str!(NoticePriority, "notice priority");
