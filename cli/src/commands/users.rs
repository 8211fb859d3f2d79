//! Users commands

use accident_portal::auth::hash_password;
use accident_portal::i18n::Language;
use accident_portal::models::{NewUser, Role, UserAccount};
use accident_portal::store::{RepositoryError, UserRepository};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use super::Context;
use crate::UserCommands;

#[derive(Debug, Serialize, Tabled)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub language: String,
}

impl From<&UserAccount> for UserRow {
    fn from(user: &UserAccount) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            language: user.language.map(|l| l.code().to_string()).unwrap_or_default(),
        }
    }
}

pub async fn handle(action: UserCommands, ctx: &Context) -> Result<(), String> {
    let store = ctx.open_store().await?;
    match action {
        UserCommands::List => {
            let rows: Vec<UserRow> =
                store.list().await.map_err(|e| e.to_string())?.iter().map(UserRow::from).collect();
            ctx.format.print(&rows);
        }
        UserCommands::Create { username, password, role, language } => {
            let user = create_user(&store, &username, &password, &role, language.as_deref()).await?;
            println!("{} Created user {} (id {})", "✓".green(), user.username, user.id);
        }
    }
    Ok(())
}

pub async fn create_user(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
    role: &str,
    language: Option<&str>,
) -> Result<UserAccount, String> {
    let username = username.trim();
    if username.is_empty() {
        return Err("Username must not be empty".into());
    }
    if password.is_empty() {
        return Err("Password must not be empty".into());
    }
    let role = match role {
        "admin" => Role::Admin,
        "user" => Role::User,
        other => return Err(format!("Unknown role: {} (expected admin or user)", other)),
    };
    let language = match language {
        Some(code) => Some(
            Language::parse(code)
                .ok_or_else(|| format!("Unknown language: {} (expected ar or en)", code))?,
        ),
        None => None,
    };

    let new_user = NewUser {
        username: username.to_string(),
        password_hash: hash_password(password).map_err(|e| e.to_string())?,
        role,
        language,
    };
    users.create(new_user).await.map_err(|e| match e {
        RepositoryError::Conflict(_) => format!("User {} already exists", username),
        other => other.to_string(),
    })
}
