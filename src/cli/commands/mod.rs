pub mod auth;
pub mod navigate;
pub mod rbac;
pub mod roles;
pub mod users;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::auth::ResolvedIdentity;
use crate::cli::config::ClientConfig;
use crate::client::{ApiClient, ClientError, IdentitySource};

/// Client for the configured server, carrying the stored token if any.
pub(crate) fn client(config: &ClientConfig) -> anyhow::Result<ApiClient> {
    Ok(ApiClient::new(&config.server_url)?.with_token(config.token()?))
}

/// Like `client`, but refuses to run without a stored token.
pub(crate) fn signed_in_client(config: &ClientConfig) -> anyhow::Result<ApiClient> {
    let client = client(config)?;
    if client.token().is_none() {
        anyhow::bail!("Not logged in. Run `pressroom auth login <email>` first");
    }
    Ok(client)
}

/// Identity source backed by the stored session. A 401 from the server
/// means the token is no longer good, so the session file is removed.
pub(crate) struct StoredSession<'a> {
    pub client: &'a ApiClient,
    pub config: &'a ClientConfig,
}

#[async_trait]
impl IdentitySource for StoredSession<'_> {
    async fn fetch_identity(&self) -> Result<Option<ResolvedIdentity>, ClientError> {
        if self.client.token().is_none() {
            return Ok(None);
        }
        match self.client.me().await {
            Ok(identity) => Ok(Some(identity)),
            Err(ClientError::Unauthorized(message)) => {
                if let Err(e) = self.config.clear_session() {
                    warn!(error = %e, "failed to clear rejected session");
                }
                debug!(%message, "stored session rejected");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
