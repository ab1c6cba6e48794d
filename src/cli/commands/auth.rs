use clap::Subcommand;
use serde_json::json;

use crate::auth::{IssuedSession, NewAccount, ResolvedIdentity};
use crate::cli::config::{ClientConfig, Session};
use crate::cli::utils::{output_data, output_success, resolve_password};
use crate::cli::OutputFormat;
use crate::client::IdentitySource;
use crate::handlers::protected::auth::me::ProfileUpdate;

use super::{client, navigate, signed_in_client, StoredSession};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (falls back to PRESSROOM_PASSWORD, then stdin)")]
        password: Option<String>,
        #[arg(long, help = "View to open after login (defaults to the one last redirected from)")]
        return_to: Option<String>,
    },

    #[command(about = "Create an account and login")]
    Signup {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (falls back to PRESSROOM_PASSWORD, then stdin)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Update your own profile")]
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, help = "New password")]
        password: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, config: &ClientConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login {
            email,
            password,
            return_to,
        } => {
            let password = resolve_password(password)?;
            let session = client(config)?.login(&email, &password).await?;
            store_session(config, &session)?;
            output_success(
                &output_format,
                &format!("Logged in as {}", describe(&session.user)),
                Some(json!({ "user": session.user })),
            )?;
            resume(config, return_to, output_format).await
        }
        AuthCommands::Signup {
            username,
            email,
            password,
        } => {
            let account = NewAccount {
                username,
                email,
                password: resolve_password(password)?,
            };
            let session = client(config)?.signup(&account).await?;
            store_session(config, &session)?;
            output_success(
                &output_format,
                &format!("Account created, logged in as {}", describe(&session.user)),
                Some(json!({ "user": session.user })),
            )?;
            resume(config, None, output_format).await
        }
        AuthCommands::Logout => {
            let message = if config.clear_session()? {
                "Logged out"
            } else {
                "No stored session"
            };
            output_success(&output_format, message, None)
        }
        AuthCommands::Whoami => {
            let client = client(config)?;
            let source = StoredSession {
                client: &client,
                config,
            };
            match source.fetch_identity().await? {
                Some(identity) => output_data(&output_format, &identity, |identity| {
                    println!("{}", describe(identity));
                    println!("Status: {}", identity.status);
                    println!("Permissions: [{}]", identity.permissions());
                }),
                None => anyhow::bail!("Not logged in"),
            }
        }
        AuthCommands::Profile {
            username,
            email,
            password,
        } => {
            let update = ProfileUpdate {
                username,
                email,
                password,
            };
            let identity = signed_in_client(config)?.update_profile(&update).await?;
            output_success(
                &output_format,
                &format!("Profile updated: {}", describe(&identity)),
                Some(json!({ "user": identity })),
            )
        }
    }
}

/// Open the view the visitor was sent away from, if any.
async fn resume(config: &ClientConfig, explicit: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let remembered = config.take_return_to()?;
    match explicit.or(remembered) {
        Some(path) => navigate::open(&path, config, output_format).await,
        None => Ok(()),
    }
}

fn store_session(config: &ClientConfig, session: &IssuedSession) -> anyhow::Result<()> {
    config.save_session(&Session::new(
        config.server_url.clone(),
        session.token.clone(),
        session.user.email.clone(),
    ))
}

pub(crate) fn describe(identity: &ResolvedIdentity) -> String {
    match identity.role_name() {
        Some(role) => format!("{} <{}> ({})", identity.username, identity.email, role),
        None => format!("{} <{}> (no role)", identity.username, identity.email),
    }
}
