mod cleanup;
mod user;

pub use cleanup::cmd_cleanup;
pub use user::{cmd_user_create, cmd_user_list, cmd_user_set_role};
