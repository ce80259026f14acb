//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Role;

/// labdesk - computer lab management server
#[derive(Parser)]
#[command(name = "labdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server with the cleanup scheduler
    #[command(alias = "daemon", alias = "-d")]
    Serve,

    /// Delete old issues once and exit
    Cleanup,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an account with a role
    Create {
        email: String,
        /// Full name shown in the UI
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        /// admin, lab_staff or student
        #[arg(long, default_value = "student")]
        role: Role,
    },

    /// List accounts and their roles
    #[command(alias = "ls")]
    List,

    /// Change the role of an account
    SetRole {
        /// Account email
        email: String,
        role: Role,
    },
}

pub use commands::*;
