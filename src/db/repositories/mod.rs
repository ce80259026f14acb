pub mod booking;
pub mod computer;
pub mod issue;
pub mod logs;
pub mod maintenance;
pub mod notice;
pub mod notification;
pub mod profile;
pub mod session;
pub mod software;
pub mod user;
