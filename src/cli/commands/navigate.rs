use std::sync::Arc;

use serde_json::json;

use crate::cli::config::ClientConfig;
use crate::cli::utils::{output_data, output_empty_collection};
use crate::cli::OutputFormat;
use crate::client::{find_view, refreshed_navigation, GuardState, IdentityContext, Navigator, RouteGuard};

use super::{client, StoredSession};

/// Prints guard effects to the terminal.
pub struct TerminalNavigator {
    format: OutputFormat,
}

impl TerminalNavigator {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Navigator for TerminalNavigator {
    fn notify(&self, message: &str) {
        match self.format {
            OutputFormat::Json => println!("{}", json!({ "event": "notice", "message": message })),
            OutputFormat::Text => eprintln!("⚠ {}", message),
        }
    }

    fn redirect(&self, to: &str, return_to: Option<&str>) {
        match self.format {
            OutputFormat::Json => println!("{}", json!({ "event": "redirect", "to": to, "return_to": return_to })),
            OutputFormat::Text => match return_to {
                Some(from) => println!("→ Redirecting to {} (will return to {})", to, from),
                None => println!("→ Redirecting to {}", to),
            },
        }
    }
}

/// Open a view through the route guard.
pub async fn open(path: &str, config: &ClientConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let view = find_view(path).ok_or_else(|| anyhow::anyhow!("No view at '{}'", path))?;
    let client = client(config)?;
    let source = StoredSession {
        client: &client,
        config,
    };

    let identity = IdentityContext::new();
    let navigator = Arc::new(TerminalNavigator::new(output_format.clone()));
    let mut guard = RouteGuard::mount(view, navigator, config.denied_redirect);

    if let OutputFormat::Text = output_format {
        println!("Loading {}...", view.path);
    }

    let state = guard.resolve(&identity, &source).await.clone();
    match &state {
        GuardState::AuthorizedSuperAdmin | GuardState::AuthorizedByPermission => {
            output_data(&output_format, &json!({ "view": view.path, "guard": state }), |_| {
                println!("{} ({})", view.label, view.path);
            })?;
        }
        GuardState::Denied { .. } => guard.settle().await,
        GuardState::Unauthenticated { return_to, .. } => config.save_return_to(return_to)?,
        GuardState::Resolving => {}
    }
    Ok(())
}

/// Print navigation links for a freshly refreshed identity.
pub async fn nav(config: &ClientConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = client(config)?;
    let source = StoredSession {
        client: &client,
        config,
    };

    let links = refreshed_navigation(&IdentityContext::new(), &source).await;
    if links.is_empty() {
        return output_empty_collection(&output_format, "links", "Not logged in; nothing to navigate to");
    }

    output_data(&output_format, &links, |links| {
        for link in links {
            println!("{:<16} {}", link.path, link.label);
        }
    })
}
