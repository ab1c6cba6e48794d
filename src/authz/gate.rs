//! The Authorization Gate.
//!
//! `decide` is the single decision function shared by the server middleware,
//! the role-management handlers and the client route guard.
//!
//! - No IO
//! - No panics
//! - No caching: the caller passes the identity it just resolved

use serde::{Deserialize, Serialize};

use crate::auth::ResolvedIdentity;

use super::{Permission, PermissionSet};

/// What an operation or view demands from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "permissions", rename_all = "snake_case")]
pub enum Requirement {
    /// Any resolved identity passes.
    Unrestricted,
    /// Only the reserved Super-admin role passes.
    SuperAdminOnly,
    /// Super-admin, or a role holding at least one of these permissions.
    AnyOf(PermissionSet),
}

impl Requirement {
    /// Build a permission requirement; an empty list declares an open view.
    pub fn any_of<I>(permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        let set: PermissionSet = permissions.into_iter().collect();
        if set.is_empty() {
            Requirement::Unrestricted
        } else {
            Requirement::AnyOf(set)
        }
    }
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Requirement::Unrestricted => f.write_str("any signed-in user"),
            Requirement::SuperAdminOnly => f.write_str("super-admin only"),
            Requirement::AnyOf(set) => write!(f, "any of [{}]", set),
        }
    }
}

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Denial {
    SuperAdminRequired,
    MissingPermission { any_of: PermissionSet },
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Denial::SuperAdminRequired => {
                write!(f, "Access denied: only the {} role can open this", super::SUPER_ADMIN_ROLE)
            }
            Denial::MissingPermission { any_of } if any_of.is_empty() => {
                f.write_str("Access denied: no permission grants this")
            }
            Denial::MissingPermission { any_of } => {
                write!(f, "Access denied: your role needs one of these permissions: {}", any_of)
            }
        }
    }
}

/// Outcome of `decide`. Never a bare bool.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

/// Decide whether `identity` satisfies `requirement`.
///
/// Super-admin is checked by role name before anything else and wins for
/// every requirement shape. For `AnyOf`, holding any single listed permission
/// is enough; an empty `AnyOf` is never satisfied by a permission match.
pub fn decide(identity: &ResolvedIdentity, requirement: &Requirement) -> Decision {
    if identity.is_super_admin() {
        return Decision::Allow;
    }

    match requirement {
        Requirement::Unrestricted => Decision::Allow,
        Requirement::SuperAdminOnly => Decision::Deny(Denial::SuperAdminRequired),
        Requirement::AnyOf(required) => {
            if identity.permissions().intersects(required) {
                Decision::Allow
            } else {
                Decision::Deny(Denial::MissingPermission {
                    any_of: required.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{known, SUPER_ADMIN_ROLE};
    use crate::testing::{dangling_identity, identity_with_role};

    fn perms(names: &[&str]) -> PermissionSet {
        PermissionSet::parse(names.iter().copied()).unwrap()
    }

    fn all_shapes() -> Vec<Requirement> {
        vec![
            Requirement::Unrestricted,
            Requirement::SuperAdminOnly,
            Requirement::AnyOf(perms(&["manage_users"])),
            Requirement::AnyOf(perms(&["manage_posts", "create_posts"])),
            Requirement::AnyOf(PermissionSet::empty()),
        ]
    }

    #[test]
    fn super_admin_is_allowed_for_every_shape() {
        let admin = identity_with_role(SUPER_ADMIN_ROLE, &[]);
        for requirement in all_shapes() {
            assert_eq!(decide(&admin, &requirement), Decision::Allow, "{requirement}");
        }
    }

    #[test]
    fn super_admin_name_is_case_sensitive() {
        let impostor = identity_with_role("super-admin", &[]);
        assert_eq!(
            decide(&impostor, &Requirement::SuperAdminOnly),
            Decision::Deny(Denial::SuperAdminRequired)
        );
    }

    #[test]
    fn any_of_allows_on_intersection_only() {
        let editor = identity_with_role("Editor", &["create_posts", "manage_posts"]);

        assert!(decide(&editor, &Requirement::AnyOf(perms(&["manage_posts"]))).is_allow());
        // One listed permission is enough.
        assert!(decide(&editor, &Requirement::AnyOf(perms(&["manage_users", "create_posts"]))).is_allow());
        // Disjoint, non-empty requirement.
        assert_eq!(
            decide(&editor, &Requirement::AnyOf(perms(&["manage_users", "manage_roles"]))),
            Decision::Deny(Denial::MissingPermission {
                any_of: perms(&["manage_users", "manage_roles"])
            })
        );
    }

    #[test]
    fn empty_any_of_denies_regular_roles() {
        let editor = identity_with_role("Editor", &["manage_posts"]);
        assert!(!decide(&editor, &Requirement::AnyOf(PermissionSet::empty())).is_allow());
    }

    #[test]
    fn super_admin_only_denies_fully_privileged_roles() {
        let manager = identity_with_role("Manager", &["manage_users", "manage_roles", "manage_posts"]);
        assert_eq!(
            decide(&manager, &Requirement::SuperAdminOnly),
            Decision::Deny(Denial::SuperAdminRequired)
        );
    }

    #[test]
    fn user_role_without_permissions_is_forbidden_from_post_management() {
        let user = identity_with_role("User", &[]);
        let requirement = Requirement::any_of([known::MANAGE_POSTS]);
        assert!(!decide(&user, &requirement).is_allow());
    }

    #[test]
    fn empty_super_admin_role_bypasses_permission_check() {
        let admin = identity_with_role(SUPER_ADMIN_ROLE, &[]);
        let requirement = Requirement::any_of([known::MANAGE_USERS]);
        assert_eq!(decide(&admin, &requirement), Decision::Allow);
    }

    #[test]
    fn dangling_role_fails_closed() {
        let orphan = dangling_identity();
        assert!(!decide(&orphan, &Requirement::SuperAdminOnly).is_allow());
        assert!(!decide(&orphan, &Requirement::any_of([known::MANAGE_POSTS])).is_allow());
        assert!(decide(&orphan, &Requirement::Unrestricted).is_allow());
    }

    #[test]
    fn empty_declaration_is_unrestricted() {
        assert_eq!(Requirement::any_of(Vec::new()), Requirement::Unrestricted);
    }

    #[test]
    fn denial_messages_are_human_readable() {
        let denial = Denial::MissingPermission {
            any_of: perms(&["manage_posts"]),
        };
        assert_eq!(
            denial.to_string(),
            "Access denied: your role needs one of these permissions: manage_posts"
        );
        assert!(Denial::SuperAdminRequired.to_string().contains(SUPER_ADMIN_ROLE));
    }
}
