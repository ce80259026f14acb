//! Account management from the command line

use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::domain::Role;
use crate::services::{Actor, AuthService, Registration, SeaOrmAuthService, UserService};

/// The operator at the terminal acts with admin rights.
fn operator() -> Actor {
    Actor::new("cli", "cli@localhost", Role::Admin)
}

pub async fn cmd_user_create(
    config: &Config,
    email: &str,
    name: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);
    let auth = SeaOrmAuthService::new(store, Arc::new(RwLock::new(config.clone())), event_bus);

    let created = auth
        .create_account(
            Registration {
                email: email.to_string(),
                password: password.to_string(),
                full_name: name.to_string(),
                student_id: None,
                department: None,
            },
            role,
        )
        .await?;

    println!("Created {} ({})", created.email, created.role);
    println!("  ID:      {}", created.user_id);
    println!("  API key: {}", created.api_key);
    Ok(())
}

pub async fn cmd_user_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = UserService::new(store).list(&operator()).await?;

    if users.is_empty() {
        println!("No accounts.");
        return Ok(());
    }

    println!("Accounts ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        println!(
            "{:<10} {:<32} {}",
            user.role.as_str(),
            user.profile.email,
            user.profile.full_name
        );
    }

    Ok(())
}

pub async fn cmd_user_set_role(config: &Config, email: &str, role: Role) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.users().get_by_email(email).await? else {
        anyhow::bail!("No account for {email}");
    };

    UserService::new(store)
        .set_role(&operator(), &user.id, role)
        .await?;

    println!("{} is now {}", user.email, role);
    Ok(())
}
