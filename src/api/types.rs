use serde::{Deserialize, Serialize};

use crate::domain::{BookingStatus, ComputerStatus, IssueStatus, Role};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ComputerListQuery {
    pub status: Option<ComputerStatus>,
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueListQuery {
    pub status: Option<IssueStatus>,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceListQuery {
    pub computer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignSoftwareRequest {
    pub computer_id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub csv: String,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub level: Option<String>,
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse<T> {
    pub logs: Vec<T>,
    pub total_pages: u64,
}
