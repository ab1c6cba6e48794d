use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::authz::DEFAULT_ROLE;
use crate::database::models::{AccountStatus, NewUser};
use crate::database::{CredentialStore, RoleStore, StoreError};

use super::{AuthError, PasswordHasher, ResolvedIdentity, SessionTokens};

/// Signup input, already format-validated by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A freshly issued token together with the identity it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    pub token: String,
    pub user: ResolvedIdentity,
}

/// Turns verified credentials into session tokens.
pub struct SessionIssuer {
    users: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleStore>,
    tokens: SessionTokens,
    passwords: PasswordHasher,
}

impl SessionIssuer {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        roles: Arc<dyn RoleStore>,
        tokens: SessionTokens,
        passwords: PasswordHasher,
    ) -> Self {
        Self {
            users,
            roles,
            tokens,
            passwords,
        }
    }

    /// Every failure to match is `InvalidCredentials`: unknown email, wrong
    /// password and inactive account are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            self.passwords.verify_absent(password).await?;
            info!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash).await? || !user.is_active() {
            info!("login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        let role = self.roles.find_role(user.role_id).await?;
        info!(user_id = %user.id, "session issued");

        Ok(IssuedSession {
            token,
            user: ResolvedIdentity::join(user, role),
        })
    }

    /// Create an active account holding the default role and sign it in.
    pub async fn signup(&self, account: NewAccount) -> Result<IssuedSession, AuthError> {
        if self.users.find_user_by_email(&account.email).await?.is_some() {
            return Err(AuthError::EmailTaken(account.email));
        }

        let role = self
            .roles
            .find_role_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| AuthError::DefaultRoleMissing(DEFAULT_ROLE.to_string()))?;

        let password_hash = self.passwords.hash(&account.password).await?;
        let user = self
            .users
            .insert_user(NewUser {
                username: account.username.trim().to_string(),
                email: account.email.clone(),
                password_hash,
                status: AccountStatus::Active,
                role_id: role.id,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict { .. } => AuthError::EmailTaken(account.email),
                other => AuthError::Store(other),
            })?;

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, role = %role.name, "account created");

        Ok(IssuedSession {
            token,
            user: ResolvedIdentity::join(user, Some(role)),
        })
    }
}
