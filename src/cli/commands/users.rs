use clap::Subcommand;
use serde_json::json;

use crate::cli::config::ClientConfig;
use crate::cli::utils::{output_data, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::models::{AccountStatus, RoleId, UserId};
use crate::handlers::protected::users::AdminUserUpdate;

use super::auth::describe;
use super::signed_in_client;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List users")]
    List,

    #[command(about = "Update a user; only given fields change")]
    Update {
        id: UserId,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, help = "Role id to assign")]
        role: Option<RoleId>,
        #[arg(long, help = "active or inactive")]
        status: Option<AccountStatus>,
    },

    #[command(about = "Delete a user")]
    Delete { id: UserId },
}

pub async fn handle(cmd: UserCommands, config: &ClientConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = signed_in_client(config)?;

    match cmd {
        UserCommands::List => {
            let users = client.list_users().await?;
            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users");
            }
            output_data(&output_format, &users, |users| {
                for user in users {
                    println!("{}  {}  {}", user.id, user.status, describe(user));
                }
            })
        }
        UserCommands::Update {
            id,
            username,
            email,
            role,
            status,
        } => {
            let update = AdminUserUpdate {
                username,
                email,
                role,
                status,
            };
            let user = client.update_user(id, &update).await?;
            output_success(
                &output_format,
                &format!("Updated {}", describe(&user)),
                Some(json!({ "user": user })),
            )
        }
        UserCommands::Delete { id } => {
            client.delete_user(id).await?;
            output_success(&output_format, &format!("User {} deleted", id), Some(json!({ "id": id })))
        }
    }
}
