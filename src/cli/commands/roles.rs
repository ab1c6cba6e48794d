use clap::Subcommand;
use serde_json::json;

use crate::authz::PermissionSet;
use crate::cli::config::ClientConfig;
use crate::cli::utils::{output_data, output_empty_collection, output_success, split_list};
use crate::cli::OutputFormat;
use crate::database::models::{NewRole, RoleId, RoleUpdate};

use super::signed_in_client;

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "List roles")]
    List,

    #[command(about = "Create a role")]
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, help = "Comma-separated permissions", default_value = "")]
        permissions: String,
    },

    #[command(about = "Update a role; only given fields change")]
    Update {
        id: RoleId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, help = "Comma-separated permissions, replacing the current set")]
        permissions: Option<String>,
    },

    #[command(about = "Delete a role; its members keep a dangling reference")]
    Delete { id: RoleId },
}

pub async fn handle(cmd: RoleCommands, config: &ClientConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = signed_in_client(config)?;

    match cmd {
        RoleCommands::List => {
            let roles = client.list_roles().await?;
            if roles.is_empty() {
                return output_empty_collection(&output_format, "roles", "No roles");
            }
            output_data(&output_format, &roles, |roles| {
                for role in roles {
                    println!("{}  {:<20} [{}]", role.id, role.name, role.permissions);
                }
            })
        }
        RoleCommands::Create {
            name,
            description,
            permissions,
        } => {
            let role = NewRole {
                name,
                description,
                permissions: PermissionSet::parse(split_list(&permissions))?,
            };
            let role = client.create_role(&role).await?;
            output_success(
                &output_format,
                &format!("Role '{}' created ({})", role.name, role.id),
                Some(json!({ "role": role })),
            )
        }
        RoleCommands::Update {
            id,
            name,
            description,
            permissions,
        } => {
            let update = RoleUpdate {
                name,
                description,
                permissions: permissions
                    .map(|p| PermissionSet::parse(split_list(&p)))
                    .transpose()?,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update");
            }
            let role = client.update_role(id, &update).await?;
            output_success(
                &output_format,
                &format!("Role '{}' updated", role.name),
                Some(json!({ "role": role })),
            )
        }
        RoleCommands::Delete { id } => {
            client.delete_role(id).await?;
            output_success(&output_format, &format!("Role {} deleted", id), Some(json!({ "id": id })))
        }
    }
}
