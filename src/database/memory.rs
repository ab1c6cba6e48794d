use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::models::user::normalize_email;
use super::models::{NewRole, NewUser, Role, RoleId, RoleUpdate, UserId, UserRecord, UserUpdate};
use super::store::{CredentialStore, RoleStore, StoreError};

/// In-process store used when no `DATABASE_URL` is configured, and by tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<UserId, UserRecord>>>,
    roles: Arc<RwLock<HashMap<RoleId, Role>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = user.into_record(UserId::new(), Utc::now());

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == record.email) {
            return Err(StoreError::conflict("user", format!("email '{}'", record.email)));
        }
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<UserRecord>, StoreError> {
        let mut users = self.users.write().await;

        if let Some(email) = &update.email {
            let email = normalize_email(email);
            if users.values().any(|u| u.id != id && u.email == email) {
                return Err(StoreError::conflict("user", format!("email '{}'", email)));
            }
        }

        match users.get_mut(&id) {
            Some(user) => {
                update.apply(user, Utc::now());
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        Ok(self.roles.read().await.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let roles = self.roles.read().await;
        Ok(roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let mut roles: Vec<Role> = self.roles.read().await.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn insert_role(&self, role: NewRole) -> Result<Role, StoreError> {
        let role = role.into_role(RoleId::new());

        let mut roles = self.roles.write().await;
        if roles.values().any(|r| r.name == role.name) {
            return Err(StoreError::conflict("role", format!("name '{}'", role.name)));
        }
        roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, id: RoleId, update: RoleUpdate) -> Result<Option<Role>, StoreError> {
        let mut roles = self.roles.write().await;

        if let Some(name) = &update.name {
            let name = name.trim();
            if roles.values().any(|r| r.id != id && r.name == name) {
                return Err(StoreError::conflict("role", format!("name '{}'", name)));
            }
        }

        match roles.get_mut(&id) {
            Some(role) => {
                update.apply(role);
                Ok(Some(role.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_role(&self, id: RoleId) -> Result<bool, StoreError> {
        Ok(self.roles.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::PermissionSet;
    use crate::database::models::AccountStatus;

    fn new_user(email: &str, role_id: RoleId) -> NewUser {
        NewUser {
            username: "someone".into(),
            email: email.into(),
            password_hash: "hash".into(),
            status: AccountStatus::Active,
            role_id,
        }
    }

    fn new_role(name: &str) -> NewRole {
        NewRole {
            name: name.into(),
            description: String::new(),
            permissions: PermissionSet::empty(),
        }
    }

    #[tokio::test]
    async fn emails_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com", RoleId::new())).await.unwrap();

        let err = store.insert_user(new_user("A@Example.com", RoleId::new())).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { entity: "user", .. }));

        let found = store.find_user_by_email("A@EXAMPLE.COM").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn updating_email_to_a_taken_one_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com", RoleId::new())).await.unwrap();
        let b = store.insert_user(new_user("b@example.com", RoleId::new())).await.unwrap();

        let update = UserUpdate {
            email: Some("a@example.com".into()),
            ..Default::default()
        };
        assert!(store.update_user(b.id, update).await.is_err());
    }

    #[tokio::test]
    async fn role_names_are_unique() {
        let store = MemoryStore::new();
        store.insert_role(new_role("Editor")).await.unwrap();
        assert!(store.insert_role(new_role("Editor")).await.is_err());
    }

    #[tokio::test]
    async fn deleting_a_role_leaves_users_untouched() {
        let store = MemoryStore::new();
        let role = store.insert_role(new_role("Editor")).await.unwrap();
        let user = store.insert_user(new_user("a@example.com", role.id)).await.unwrap();

        assert!(store.delete_role(role.id).await.unwrap());
        assert!(!store.delete_role(role.id).await.unwrap());

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.role_id, role.id);
        assert!(store.find_role(role.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_records_returns_none() {
        let store = MemoryStore::new();
        assert!(store
            .update_role(RoleId::new(), RoleUpdate::default())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .update_user(UserId::new(), UserUpdate::default())
            .await
            .unwrap()
            .is_none());
    }
}
