// User management CLI commands

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::app_data::AppData;
use crate::cli::UserCommands;
use crate::coordinators::IdentityCoordinator;
use crate::types::{PageRequest, User};

pub async fn execute_user_command(
    command: UserCommands,
    app_data: Arc<AppData>,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = IdentityCoordinator::new(app_data);

    match command {
        UserCommands::Create { username, email, password } => {
            let password = password_or_prompt(password)?;
            let user = identity.register_user(&username, &email, &password).await?;
            println!("Created user {}", format_user(&user));
        }
        UserCommands::Get { id } => {
            let user = identity.get_user(id).await?;
            println!("{}", format_user(&user));
        }
        UserCommands::List { page, page_size } => {
            let page = PageRequest::new(page, page_size);
            let users = identity.list_users(page).await?;
            let total = identity.count_users().await?;
            for user in &users {
                println!("{}", format_user(user));
            }
            println!("-- page {} ({} of {} users)", page.page(), users.len(), total);
        }
        UserCommands::Delete { id } => {
            identity.delete_user(id).await?;
            println!("Deleted user {}", id);
        }
    }

    Ok(())
}

pub async fn login(
    app_data: Arc<AppData>,
    username: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = password_or_prompt(password)?;
    let outcome = IdentityCoordinator::new(app_data).login(username, &password).await?;

    println!("{}", outcome.token);
    Ok(())
}

pub async fn verify_token(app_data: Arc<AppData>, token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let claims = IdentityCoordinator::new(app_data).authenticate(token).await?;

    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}

fn format_user(user: &User) -> String {
    format!("#{} {} <{}>", user.id, user.username, user.email)
}

fn password_or_prompt(password: Option<String>) -> Result<String, io::Error> {
    if let Some(password) = password {
        return Ok(password);
    }

    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
