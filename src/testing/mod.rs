//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{PasswordHasher, ResolvedIdentity, SessionIssuer, SessionTokens, SessionVerifier};
use crate::authz::PermissionSet;
use crate::database::models::{
    AccountStatus, NewRole, NewUser, Role, RoleGrant, RoleId, UserId, UserRecord, UserUpdate,
};
use crate::database::{CredentialStore, MemoryStore, RoleStore};

pub const TEST_SECRET: &str = "pressroom-test-secret";

/// An identity holding a role with the given name and permissions.
pub fn identity_with_role(name: &str, permissions: &[&str]) -> ResolvedIdentity {
    let role = Role {
        id: RoleId::new(),
        name: name.to_string(),
        description: String::new(),
        permissions: PermissionSet::parse(permissions.iter().copied()).unwrap(),
    };
    let mut identity = ResolvedIdentity::join(user_record(role.id), None);
    identity.role = RoleGrant::Assigned(role);
    identity
}

/// An identity whose role reference points at nothing.
pub fn dangling_identity() -> ResolvedIdentity {
    ResolvedIdentity::join(user_record(RoleId::new()), None)
}

fn user_record(role_id: RoleId) -> UserRecord {
    NewUser {
        username: "tester".into(),
        email: format!("{}@example.com", UserId::new()),
        password_hash: "$2b$04$unused".into(),
        status: AccountStatus::Active,
        role_id,
    }
    .into_record(UserId::new(), Utc::now())
}

/// In-memory stores plus the token and password services wired to them.
pub struct Harness {
    pub store: MemoryStore,
    pub tokens: SessionTokens,
    pub passwords: PasswordHasher,
}

impl Harness {
    pub const PASSWORD: &'static str = "Passw0rd!";

    pub async fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            tokens: SessionTokens::new(TEST_SECRET),
            passwords: PasswordHasher::new(4).unwrap(),
        }
    }

    pub async fn role(&self, name: &str, permissions: &[&str]) -> Role {
        self.store
            .insert_role(NewRole {
                name: name.to_string(),
                description: format!("{} role", name),
                permissions: PermissionSet::parse(permissions.iter().copied()).unwrap(),
            })
            .await
            .unwrap()
    }

    /// Create an active user whose password is `Harness::PASSWORD`.
    pub async fn user(&self, email: &str, role_id: RoleId) -> UserRecord {
        let password_hash = self.passwords.hash(Self::PASSWORD).await.unwrap();
        let username = email.split('@').next().unwrap_or("user").to_string();
        self.store
            .insert_user(NewUser {
                username,
                email: email.to_string(),
                password_hash,
                status: AccountStatus::Active,
                role_id,
            })
            .await
            .unwrap()
    }

    pub async fn deactivate(&self, id: UserId) {
        let update = UserUpdate {
            status: Some(AccountStatus::Inactive),
            ..Default::default()
        };
        self.store.update_user(id, update).await.unwrap();
    }

    pub fn issuer(&self) -> SessionIssuer {
        SessionIssuer::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            self.tokens.clone(),
            self.passwords.clone(),
        )
    }

    pub fn verifier(&self) -> SessionVerifier {
        SessionVerifier::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            self.tokens.clone(),
        )
    }
}
