pub mod prelude;

pub mod bookings;
pub mod computer_software;
pub mod computers;
pub mod issues;
pub mod lab_notices;
pub mod maintenance_logs;
pub mod notifications;
pub mod profiles;
pub mod session_logs;
pub mod software;
pub mod system_logs;
pub mod user_roles;
pub mod users;
