pub use super::bookings::Entity as Bookings;
pub use super::computer_software::Entity as ComputerSoftware;
pub use super::computers::Entity as Computers;
pub use super::issues::Entity as Issues;
pub use super::lab_notices::Entity as LabNotices;
pub use super::maintenance_logs::Entity as MaintenanceLogs;
pub use super::notifications::Entity as Notifications;
pub use super::profiles::Entity as Profiles;
pub use super::session_logs::Entity as SessionLogs;
pub use super::software::Entity as Software;
pub use super::system_logs::Entity as SystemLogs;
pub use super::user_roles::Entity as UserRoles;
pub use super::users::Entity as Users;
