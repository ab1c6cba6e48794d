pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use config::ClientConfig;

#[derive(Parser)]
#[command(name = "pressroom")]
#[command(about = "Pressroom CLI - sign in, browse guarded views and manage roles")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Open a view through the route guard")]
    Open {
        #[arg(help = "View path, e.g. /manage-users")]
        path: String,
    },

    #[command(about = "Show the navigation links available to you")]
    Nav,

    #[command(about = "Role management")]
    Roles {
        #[command(subcommand)]
        cmd: commands::roles::RoleCommands,
    },

    #[command(about = "User management")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "RBAC audit report (super-admin)")]
    Rbac,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = ClientConfig::from_env()?;

    let format = output_format.clone();

    let result = match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &config, output_format).await,
        Commands::Open { path } => commands::navigate::open(&path, &config, output_format).await,
        Commands::Nav => commands::navigate::nav(&config, output_format).await,
        Commands::Roles { cmd } => commands::roles::handle(cmd, &config, output_format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, &config, output_format).await,
        Commands::Rbac => commands::rbac::report(&config, output_format).await,
    };

    if let (Err(e), OutputFormat::Json) = (&result, &format) {
        utils::output_error(&format, &e.to_string(), error_code(e))?;
    }
    result
}

fn error_code(err: &anyhow::Error) -> Option<&str> {
    match err.downcast_ref::<ClientError>()? {
        ClientError::Unauthorized(_) => Some("UNAUTHORIZED"),
        ClientError::Forbidden(_) => Some("FORBIDDEN"),
        ClientError::Api { code, .. } => Some(code.as_str()),
        ClientError::InvalidUrl(_) | ClientError::Decode(_) | ClientError::Http(_) => None,
    }
}
