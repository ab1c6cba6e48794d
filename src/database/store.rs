use async_trait::async_trait;
use thiserror::Error;

use super::models::{NewRole, NewUser, Role, RoleId, RoleUpdate, UserId, UserRecord, UserUpdate};

/// Errors from the credential and role stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} already exists: {detail}")]
    Conflict { entity: &'static str, detail: String },

    #[error("stored {entity} record is invalid: {detail}")]
    Corrupt { entity: &'static str, detail: String },

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn conflict(entity: &'static str, detail: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity,
            detail: detail.into(),
        }
    }

    pub fn corrupt(entity: &'static str, detail: impl Into<String>) -> Self {
        StoreError::Corrupt {
            entity,
            detail: detail.into(),
        }
    }
}

/// Persisted user records. Single-record reads and writes are atomic;
/// concurrent updates are last-writer-wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Lookup by email, compared case-insensitively.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Returns `None` when the user does not exist.
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<UserRecord>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Persisted role records. Deleting a role never touches users that reference it.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>, StoreError>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    /// Fails with `Conflict` when the name is taken.
    async fn insert_role(&self, role: NewRole) -> Result<Role, StoreError>;

    async fn update_role(&self, id: RoleId, update: RoleUpdate) -> Result<Option<Role>, StoreError>;

    async fn delete_role(&self, id: RoleId) -> Result<bool, StoreError>;
}
