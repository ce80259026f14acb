pub mod access;
pub use access::{Actor, Scope};

pub mod error;
pub use error::ServiceError;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, Registration, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod booking_service;
pub mod booking_service_impl;
pub use booking_service::{BookingError, BookingService};
pub use booking_service_impl::SeaOrmBookingService;

pub mod session_service;
pub mod session_service_impl;
pub use session_service::{SessionError, SessionService};
pub use session_service_impl::SeaOrmSessionService;

pub mod issue_service;
pub mod issue_service_impl;
pub use issue_service::IssueService;
pub use issue_service_impl::SeaOrmIssueService;

pub mod computers;
pub use computers::ComputerService;

pub mod software;
pub use software::SoftwareService;

pub mod maintenance;
pub use maintenance::MaintenanceService;

pub mod notices;
pub use notices::NoticeService;

pub mod notifications;
pub use notifications::NotificationService;

pub mod users;
pub use users::UserService;

pub mod reminders;
pub use reminders::ReminderService;

pub mod dashboard;
pub use dashboard::DashboardService;

pub mod transfer;
pub use transfer::TransferService;

pub mod cleanup;
pub use cleanup::CleanupService;

pub mod logs;
pub use logs::LogService;

pub mod scheduler;
pub use scheduler::Scheduler;
