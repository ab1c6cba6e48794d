use std::borrow::Cow;
use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role name that bypasses every permission check.
///
/// This is a role *name*, compared exactly. It can never be used as a
/// permission token.
pub const SUPER_ADMIN_ROLE: &str = "Super-admin";

/// Role assigned to every account created through signup.
pub const DEFAULT_ROLE: &str = "User";

/// Permission tokens the bundled views and routes know about.
pub mod known {
    use super::Permission;

    pub const MANAGE_USERS: Permission = Permission::from_static("manage_users");
    pub const MANAGE_ROLES: Permission = Permission::from_static("manage_roles");
    pub const MANAGE_POSTS: Permission = Permission::from_static("manage_posts");
    pub const CREATE_POSTS: Permission = Permission::from_static("create_posts");
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("permission name cannot be empty")]
    Empty,

    #[error("permission name '{0}' cannot contain whitespace")]
    Whitespace(String),

    #[error("'{0}' is a reserved role name and cannot be used as a permission")]
    Reserved(String),
}

/// An opaque capability name, e.g. `manage_posts`.
///
/// Permissions are flat: there is no hierarchy and no wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Validate and wrap a permission name.
    pub fn parse(name: impl Into<String>) -> Result<Self, PermissionError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PermissionError::Empty);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(PermissionError::Whitespace(name));
        }
        if name == SUPER_ADMIN_ROLE {
            return Err(PermissionError::Reserved(name));
        }
        Ok(Self(Cow::Owned(name)))
    }

    /// Compile-time permission for names known to be valid.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.0.into_owned()
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unordered, deduplicated set of permissions held by a role.
///
/// Serialized as a JSON array; duplicates in the input collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

static EMPTY: PermissionSet = PermissionSet::empty();

impl PermissionSet {
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Shared empty set, used for identities whose role could not be found.
    pub fn none() -> &'static PermissionSet {
        &EMPTY
    }

    /// Parse a list of raw names, rejecting the whole list on the first bad entry.
    pub fn parse<I, S>(names: I) -> Result<Self, PermissionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(Permission::parse).collect()
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    pub fn intersects(&self, other: &PermissionSet) -> bool {
        // Iterate the smaller side; both are usually tiny.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|p| large.contains(p))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Names in sorted order, for display and storage.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::collections::btree_set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl core::fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}
