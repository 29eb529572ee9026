// CLI module for administrative operations

pub mod migrate;
pub mod rbac;
pub mod users;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;
use crate::config::Settings;

/// Rolekeeper CLI for administrative operations
#[derive(Parser, Debug)]
#[command(name = "rolekeeper")]
#[command(about = "Rolekeeper RBAC backend CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// User account management
    #[command(subcommand)]
    User(UserCommands),

    /// Verify a password and print a session token
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Decrypt a session token and print its claims
    VerifyToken { token: String },

    /// Role management
    #[command(subcommand)]
    Role(RoleCommands),

    /// Permission management
    #[command(subcommand)]
    Permission(PermissionCommands),

    /// Give a user one or more roles
    GrantRole {
        user_id: u64,
        #[arg(required = true)]
        role_ids: Vec<u64>,
    },

    /// Take one or more roles away from a user
    RevokeRole {
        user_id: u64,
        #[arg(required = true)]
        role_ids: Vec<u64>,
    },

    /// Give a role one or more permissions
    GrantPermissions {
        role_id: u64,
        #[arg(required = true)]
        permission_ids: Vec<u64>,
    },

    /// Take one or more permissions away from a role
    RevokePermissions {
        role_id: u64,
        #[arg(required = true)]
        permission_ids: Vec<u64>,
    },

    /// Check whether a user holds a role
    CheckRole { user_id: u64, role_name: String },

    /// Check whether a user holds a permission through any role
    CheckPermission { user_id: u64, permission: String },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user
    Create {
        username: String,
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Show a user by id
    Get { id: u64 },

    /// List users, zero-based pages
    List {
        #[arg(long, default_value_t = 0)]
        page: u64,
        #[arg(long, default_value_t = 100)]
        page_size: i64,
    },

    /// Delete a user and its role links
    Delete { id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum RoleCommands {
    Create { name: String },
    List {
        #[arg(long, default_value_t = 0)]
        page: u64,
        #[arg(long, default_value_t = 100)]
        page_size: i64,
    },
    Delete { id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum PermissionCommands {
    Create { name: String },
    List {
        #[arg(long, default_value_t = 0)]
        page: u64,
        #[arg(long, default_value_t = 100)]
        page_size: i64,
    },
    Delete { id: u64 },
}

/// Execute CLI command
///
/// Routes the parsed CLI command to the appropriate handler function.
///
/// # Arguments
/// * `cli` - Parsed CLI arguments
/// * `settings` - Loaded process settings
///
/// # Returns
/// * `Ok(())` - Command executed successfully
/// * `Err(...)` - Command execution failed
pub async fn execute_command(cli: Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => migrate::run_migrations(settings).await?,
        Commands::User(command) => users::execute_user_command(command, load(settings).await?).await?,
        Commands::Login { username, password } => users::login(load(settings).await?, &username, password).await?,
        Commands::VerifyToken { token } => users::verify_token(load(settings).await?, &token).await?,
        Commands::Role(command) => rbac::execute_role_command(command, load(settings).await?).await?,
        Commands::Permission(command) => rbac::execute_permission_command(command, load(settings).await?).await?,
        Commands::GrantRole { user_id, role_ids } => {
            rbac::grant_roles(load(settings).await?, user_id, &role_ids).await?
        }
        Commands::RevokeRole { user_id, role_ids } => {
            rbac::revoke_roles(load(settings).await?, user_id, &role_ids).await?
        }
        Commands::GrantPermissions { role_id, permission_ids } => {
            rbac::grant_permissions(load(settings).await?, role_id, &permission_ids).await?
        }
        Commands::RevokePermissions { role_id, permission_ids } => {
            rbac::revoke_permissions(load(settings).await?, role_id, &permission_ids).await?
        }
        Commands::CheckRole { user_id, role_name } => {
            rbac::check_role(load(settings).await?, user_id, &role_name).await?
        }
        Commands::CheckPermission { user_id, permission } => {
            rbac::check_permission(load(settings).await?, user_id, &permission).await?
        }
    }

    Ok(())
}

async fn load(settings: &Settings) -> Result<Arc<AppData>, Box<dyn std::error::Error>> {
    Ok(Arc::new(AppData::init(settings).await?))
}
