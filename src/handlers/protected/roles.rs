// handlers/protected/roles.rs - /api/roles handlers
//
// Listing needs manage_roles or manage_users; writes need manage_roles.
// Anything that creates, renames, re-permissions or deletes the Super-admin
// role additionally needs Super-admin.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::ResolvedIdentity;
use crate::authz::SUPER_ADMIN_ROLE;
use crate::database::models::{NewRole, Role, RoleId, RoleUpdate};
use crate::error::ApiError;
use crate::handlers::protected::users::Deleted;
use crate::handlers::require_super_admin;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn roles_list(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    Ok(ApiResponse::success(state.roles.list_roles().await?))
}

pub async fn role_create(
    State(state): State<AppState>,
    Extension(actor): Extension<ResolvedIdentity>,
    payload: Result<Json<NewRole>, JsonRejection>,
) -> ApiResult<Role> {
    let Json(new_role) = payload?;
    new_role.validate()?;

    if new_role.name.trim() == SUPER_ADMIN_ROLE {
        require_super_admin(&actor)?;
    }

    let role = state.roles.insert_role(new_role).await?;
    tracing::info!(actor = %actor.id, role = %role.name, permissions = %role.permissions, "role created");
    Ok(ApiResponse::created(role))
}

pub async fn role_update(
    State(state): State<AppState>,
    Extension(actor): Extension<ResolvedIdentity>,
    id: Result<Path<RoleId>, PathRejection>,
    payload: Result<Json<RoleUpdate>, JsonRejection>,
) -> ApiResult<Role> {
    let Path(id) = id?;
    let Json(update) = payload?;
    update.validate()?;

    let existing = state
        .roles
        .find_role(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role not found"))?;

    if touches_super_admin(&existing, &update) {
        require_super_admin(&actor)?;
    }

    let role = state
        .roles
        .update_role(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Role not found"))?;

    tracing::info!(actor = %actor.id, role = %role.name, permissions = %role.permissions, "role updated");
    Ok(ApiResponse::success(role))
}

/// Users holding the deleted role keep a dangling reference and resolve with
/// no permissions.
pub async fn role_delete(
    State(state): State<AppState>,
    Extension(actor): Extension<ResolvedIdentity>,
    id: Result<Path<RoleId>, PathRejection>,
) -> ApiResult<Deleted<RoleId>> {
    let Path(id) = id?;

    let existing = state
        .roles
        .find_role(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role not found"))?;
    if existing.is_super_admin() {
        require_super_admin(&actor)?;
    }

    if !state.roles.delete_role(id).await? {
        return Err(ApiError::not_found("Role not found"));
    }

    tracing::info!(actor = %actor.id, role = %existing.name, "role deleted");
    Ok(ApiResponse::success(Deleted { id, deleted: true }))
}

fn touches_super_admin(existing: &Role, update: &RoleUpdate) -> bool {
    let renamed_to = update.name.as_deref().map(str::trim);
    let renames = renamed_to.is_some_and(|name| name != existing.name);

    if existing.is_super_admin() {
        renames || update.permissions.is_some()
    } else {
        renamed_to == Some(SUPER_ADMIN_ROLE)
    }
}
