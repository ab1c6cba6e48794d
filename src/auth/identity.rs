use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authz::PermissionSet;
use crate::database::models::{AccountStatus, Role, RoleGrant, UserId, UserRecord};

/// A user joined with its current role, computed fresh at use time.
///
/// This is also the user record shape exchanged with clients:
/// `{ id, username, email, status, role, createdAt, updatedAt }`, where `role`
/// is the embedded role object or, when the reference dangles, the bare role
/// id. The credential hash is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub status: AccountStatus,
    pub role: RoleGrant,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResolvedIdentity {
    /// Join a user with the role its reference currently points at. `None`
    /// yields a dangling grant with no permissions.
    pub fn join(user: UserRecord, role: Option<Role>) -> Self {
        let role = match role {
            Some(role) if role.id == user.role_id => RoleGrant::Assigned(role),
            _ => RoleGrant::Dangling(user.role_id),
        };
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            status: user.status,
            role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role.name()
    }

    pub fn permissions(&self) -> &PermissionSet {
        self.role.permissions()
    }

    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewUser, RoleId};

    fn user(role_id: RoleId) -> UserRecord {
        NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$2b$04$hash".into(),
            status: AccountStatus::Active,
            role_id,
        }
        .into_record(UserId::new(), Utc::now())
    }

    #[test]
    fn serialized_shape_omits_hash_and_uses_camel_case() {
        let role = Role {
            id: RoleId::new(),
            name: "Editor".into(),
            description: String::new(),
            permissions: PermissionSet::parse(["manage_posts"]).unwrap(),
        };
        let identity = ResolvedIdentity::join(user(role.id), Some(role));
        let json = serde_json::to_value(&identity).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["role"]["name"], "Editor");
        assert_eq!(json["role"]["permissions"], serde_json::json!(["manage_posts"]));
    }

    #[test]
    fn missing_role_resolves_to_bare_id_with_no_permissions() {
        let role_id = RoleId::new();
        let identity = ResolvedIdentity::join(user(role_id), None);

        assert_eq!(identity.role, RoleGrant::Dangling(role_id));
        assert!(identity.permissions().is_empty());
        assert!(!identity.is_super_admin());
        assert_eq!(identity.role_name(), None);

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["role"], serde_json::json!(role_id.to_string()));
    }

    #[test]
    fn mismatched_role_is_not_joined() {
        let role = Role {
            id: RoleId::new(),
            name: "Super-admin".into(),
            description: String::new(),
            permissions: PermissionSet::empty(),
        };
        let identity = ResolvedIdentity::join(user(RoleId::new()), Some(role));
        assert!(!identity.is_super_admin());
    }
}
