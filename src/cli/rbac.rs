// Role, permission and association CLI commands

use std::sync::Arc;

use crate::app_data::AppData;
use crate::cli::{PermissionCommands, RoleCommands};
use crate::coordinators::{AssociationCoordinator, PermissionCoordinator, RoleCoordinator};
use crate::types::{AssignOutcome, PageRequest};

pub async fn execute_role_command(
    command: RoleCommands,
    app_data: Arc<AppData>,
) -> Result<(), Box<dyn std::error::Error>> {
    let roles = RoleCoordinator::new(app_data);

    match command {
        RoleCommands::Create { name } => {
            let role = roles.create_role(&name).await?;
            println!("Created role #{} {}", role.id, role.name);
        }
        RoleCommands::List { page, page_size } => {
            for role in roles.list_roles(PageRequest::new(page, page_size)).await? {
                println!("#{} {}", role.id, role.name);
            }
        }
        RoleCommands::Delete { id } => {
            roles.delete_role(id).await?;
            println!("Deleted role {}", id);
        }
    }

    Ok(())
}

pub async fn execute_permission_command(
    command: PermissionCommands,
    app_data: Arc<AppData>,
) -> Result<(), Box<dyn std::error::Error>> {
    let permissions = PermissionCoordinator::new(app_data);

    match command {
        PermissionCommands::Create { name } => {
            let permission = permissions.create_permission(&name).await?;
            println!("Created permission #{} {}", permission.id, permission.name);
        }
        PermissionCommands::List { page, page_size } => {
            for permission in permissions.list_permissions(PageRequest::new(page, page_size)).await? {
                println!("#{} {}", permission.id, permission.name);
            }
        }
        PermissionCommands::Delete { id } => {
            permissions.delete_permission(id).await?;
            println!("Deleted permission {}", id);
        }
    }

    Ok(())
}

pub async fn grant_roles(app_data: Arc<AppData>, user_id: u64, role_ids: &[u64]) -> Result<(), Box<dyn std::error::Error>> {
    let outcomes = AssociationCoordinator::new(app_data)
        .add_multiple_roles_to_user(user_id, role_ids)
        .await?;
    for (role_id, outcome) in role_ids.iter().zip(outcomes) {
        println!("user {} role {}: {}", user_id, role_id, describe(outcome));
    }
    Ok(())
}

pub async fn revoke_roles(app_data: Arc<AppData>, user_id: u64, role_ids: &[u64]) -> Result<(), Box<dyn std::error::Error>> {
    AssociationCoordinator::new(app_data)
        .remove_multiple_roles_from_user(user_id, role_ids)
        .await?;
    println!("Revoked {} role(s) from user {}", role_ids.len(), user_id);
    Ok(())
}

pub async fn grant_permissions(
    app_data: Arc<AppData>,
    role_id: u64,
    permission_ids: &[u64],
) -> Result<(), Box<dyn std::error::Error>> {
    let outcomes = AssociationCoordinator::new(app_data)
        .add_multiple_permissions_to_role(role_id, permission_ids)
        .await?;
    for (permission_id, outcome) in permission_ids.iter().zip(outcomes) {
        println!("role {} permission {}: {}", role_id, permission_id, describe(outcome));
    }
    Ok(())
}

pub async fn revoke_permissions(
    app_data: Arc<AppData>,
    role_id: u64,
    permission_ids: &[u64],
) -> Result<(), Box<dyn std::error::Error>> {
    AssociationCoordinator::new(app_data)
        .remove_multiple_permissions_from_role(role_id, permission_ids)
        .await?;
    println!("Revoked {} permission(s) from role {}", permission_ids.len(), role_id);
    Ok(())
}

pub async fn check_role(app_data: Arc<AppData>, user_id: u64, role_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let has_role = app_data.authorization_provider.user_has_role(user_id, role_name).await?;
    println!("{}", has_role);
    Ok(())
}

pub async fn check_permission(
    app_data: Arc<AppData>,
    user_id: u64,
    permission: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let has_permission = app_data
        .authorization_provider
        .user_has_permission(user_id, permission)
        .await?;
    println!("{}", has_permission);
    Ok(())
}

fn describe(outcome: AssignOutcome) -> &'static str {
    match outcome {
        AssignOutcome::Inserted => "granted",
        AssignOutcome::AlreadyPresent => "already granted",
    }
}
