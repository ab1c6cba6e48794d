use std::sync::Arc;

use tracing::{debug, warn};

use crate::database::{CredentialStore, RoleStore};

use super::{AuthError, ResolvedIdentity, SessionTokens};

/// Resolves a session token to the live user and role. Nothing is cached:
/// every call reads both stores, so role edits apply to existing sessions.
pub struct SessionVerifier {
    users: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleStore>,
    tokens: SessionTokens,
}

impl SessionVerifier {
    pub fn new(users: Arc<dyn CredentialStore>, roles: Arc<dyn RoleStore>, tokens: SessionTokens) -> Self {
        Self { users, roles, tokens }
    }

    pub async fn resolve(&self, token: &str) -> Result<ResolvedIdentity, AuthError> {
        let claims = self.tokens.verify(token)?;

        let user = self
            .users
            .find_user(claims.sub)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if !user.is_active() {
            debug!(user_id = %user.id, "session belongs to an inactive account");
            return Err(AuthError::AccountInactive);
        }

        let role = self.roles.find_role(user.role_id).await?;
        if role.is_none() {
            warn!(
                user_id = %user.id,
                role_id = %user.role_id,
                "user references a missing role; resolving with no permissions"
            );
        }

        Ok(ResolvedIdentity::join(user, role))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::authz::{decide, known, Decision, Requirement};
    use crate::database::models::{RoleUpdate, UserId};
    use crate::database::RoleStore;
    use crate::testing::Harness;

    #[tokio::test]
    async fn resolving_twice_yields_equal_identities() {
        let h = Harness::new().await;
        let role = h.role("Editor", &["manage_posts"]).await;
        let user = h.user("ada@example.com", role.id).await;
        let token = h.tokens.issue(user.id).unwrap();

        let verifier = h.verifier();
        let first = verifier.resolve(&token).await.unwrap();
        let second = verifier.resolve(&token).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn role_edits_reach_existing_tokens() {
        let h = Harness::new().await;
        let role = h.role("User", &[]).await;
        let user = h.user("ada@example.com", role.id).await;
        let token = h.tokens.issue(user.id).unwrap();
        let verifier = h.verifier();
        let requirement = Requirement::any_of([known::MANAGE_POSTS]);

        let before = verifier.resolve(&token).await.unwrap();
        assert!(!decide(&before, &requirement).is_allow());

        h.store
            .update_role(
                role.id,
                RoleUpdate {
                    permissions: Some(crate::authz::PermissionSet::parse(["manage_posts"]).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let after = verifier.resolve(&token).await.unwrap();
        assert_eq!(decide(&after, &requirement), Decision::Allow);
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let h = Harness::new().await;
        let role = h.role("User", &[]).await;
        let user = h.user("ada@example.com", role.id).await;
        let token = h
            .tokens
            .issue_at(user.id, Utc::now() - Duration::days(8))
            .unwrap();

        assert!(matches!(h.verifier().resolve(&token).await, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn deleted_account_is_not_found() {
        let h = Harness::new().await;
        let token = h.tokens.issue(UserId::new()).unwrap();
        assert!(matches!(h.verifier().resolve(&token).await, Err(AuthError::IdentityNotFound)));
    }

    #[tokio::test]
    async fn inactive_account_is_refused() {
        let h = Harness::new().await;
        let role = h.role("User", &[]).await;
        let user = h.user("ada@example.com", role.id).await;
        h.deactivate(user.id).await;
        let token = h.tokens.issue(user.id).unwrap();

        assert!(matches!(h.verifier().resolve(&token).await, Err(AuthError::AccountInactive)));
    }

    #[tokio::test]
    async fn deleted_role_fails_closed() {
        let h = Harness::new().await;
        let role = h.role("Editor", &["manage_posts", "manage_users"]).await;
        let user = h.user("ada@example.com", role.id).await;
        let token = h.tokens.issue(user.id).unwrap();
        h.store.delete_role(role.id).await.unwrap();

        let identity = h.verifier().resolve(&token).await.unwrap();
        assert!(identity.permissions().is_empty());
        assert!(!identity.is_super_admin());
        assert!(!decide(&identity, &Requirement::any_of([known::MANAGE_POSTS])).is_allow());
        assert!(!decide(&identity, &Requirement::SuperAdminOnly).is_allow());
        assert!(decide(&identity, &Requirement::Unrestricted).is_allow());
    }
}
