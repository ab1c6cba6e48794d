use tracing::info;

use crate::auth::{AuthError, PasswordHasher};
use crate::authz::{PermissionSet, DEFAULT_ROLE, SUPER_ADMIN_ROLE};
use crate::config::SeedConfig;

use super::models::{AccountStatus, NewRole, NewUser, Role};
use super::store::{CredentialStore, RoleStore, StoreError};

const DEFAULT_ROLE_DESCRIPTION: &str = "Basic user with limited permissions";
const SUPER_ADMIN_DESCRIPTION: &str = "Unrestricted administrative access";

/// Make sure the default and Super-admin roles exist. Existing records are
/// left as they are.
pub async fn ensure_default_roles(roles: &dyn RoleStore) -> Result<(Role, Role), StoreError> {
    let user = ensure_role(roles, DEFAULT_ROLE, DEFAULT_ROLE_DESCRIPTION).await?;
    let admin = ensure_role(roles, SUPER_ADMIN_ROLE, SUPER_ADMIN_DESCRIPTION).await?;
    Ok((user, admin))
}

async fn ensure_role(roles: &dyn RoleStore, name: &str, description: &str) -> Result<Role, StoreError> {
    if let Some(role) = roles.find_role_by_name(name).await? {
        return Ok(role);
    }

    let created = roles
        .insert_role(NewRole {
            name: name.to_string(),
            description: description.to_string(),
            permissions: PermissionSet::empty(),
        })
        .await;

    match created {
        Ok(role) => {
            info!(role = %role.name, "seeded role");
            Ok(role)
        }
        // Another instance seeded it first.
        Err(StoreError::Conflict { .. }) => roles
            .find_role_by_name(name)
            .await?
            .ok_or_else(|| StoreError::corrupt("role", format!("'{}' vanished during seeding", name))),
        Err(e) => Err(e),
    }
}

/// Create the bootstrap super-admin account when configured and absent.
/// Returns whether an account was created.
pub async fn ensure_super_admin(
    users: &dyn CredentialStore,
    super_admin: &Role,
    seed: &SeedConfig,
    passwords: &PasswordHasher,
) -> Result<bool, AuthError> {
    let Some((username, email, password)) = seed.super_admin() else {
        return Ok(false);
    };

    if users.find_user_by_email(email).await?.is_some() {
        return Ok(false);
    }

    let password_hash = passwords.hash(password).await?;
    let user = users
        .insert_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            status: AccountStatus::Active,
            role_id: super_admin.id,
        })
        .await?;

    info!(user_id = %user.id, "seeded super-admin account");
    Ok(true)
}
