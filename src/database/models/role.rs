use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::{PermissionSet, SUPER_ADMIN_ROLE};

use super::ValidationError;

/// Identifier of a role record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(Uuid);

impl RoleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RoleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RoleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A role record: `{ id, name, description, permissions }`.
///
/// Every field is required on the wire; a record missing one is rejected at
/// deserialization rather than flowing into authorization as an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub permissions: PermissionSet,
}

impl Role {
    pub fn is_super_admin(&self) -> bool {
        self.name == SUPER_ADMIN_ROLE
    }
}

/// Payload for creating a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub permissions: PermissionSet,
}

impl NewRole {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_role_name(&self.name)
    }

    pub fn into_role(self, id: RoleId) -> Role {
        Role {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            permissions: self.permissions,
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSet>,
}

impl RoleUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => validate_role_name(name),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.permissions.is_none()
    }

    pub fn apply(&self, role: &mut Role) {
        if let Some(name) = &self.name {
            role.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            role.description = description.clone();
        }
        if let Some(permissions) = &self.permissions {
            role.permissions = permissions.clone();
        }
    }
}

/// The role side of a user record, as resolved at use time.
///
/// Serializes as the embedded role object, or as the bare role id when the
/// referenced role no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleGrant {
    Assigned(Role),
    Dangling(RoleId),
}

impl RoleGrant {
    pub fn role_id(&self) -> RoleId {
        match self {
            RoleGrant::Assigned(role) => role.id,
            RoleGrant::Dangling(id) => *id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RoleGrant::Assigned(role) => Some(role.name.as_str()),
            RoleGrant::Dangling(_) => None,
        }
    }

    /// Current permissions; a dangling reference grants nothing.
    pub fn permissions(&self) -> &PermissionSet {
        match self {
            RoleGrant::Assigned(role) => &role.permissions,
            RoleGrant::Dangling(_) => PermissionSet::none(),
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, RoleGrant::Assigned(role) if role.is_super_admin())
    }
}

pub fn validate_role_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "Role name cannot be empty"));
    }
    if name.len() > 64 {
        return Err(ValidationError::new("name", "Role name must be at most 64 characters"));
    }
    Ok(())
}
