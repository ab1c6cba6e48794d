// handlers/protected/users.rs - /api/users admin handlers (manage_users)

use std::collections::HashMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::ResolvedIdentity;
use crate::database::models::{AccountStatus, Role, RoleId, UserId, UserUpdate};
use crate::error::ApiError;
use crate::handlers::require_super_admin;
use crate::handlers::validation::{self, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};

/// Admin edit of another account; only present fields change.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AdminUserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted<T> {
    pub id: T,
    pub deleted: bool,
}

pub async fn users_list(State(state): State<AppState>) -> ApiResult<Vec<ResolvedIdentity>> {
    let roles: HashMap<RoleId, Role> = state
        .roles
        .list_roles()
        .await?
        .into_iter()
        .map(|role| (role.id, role))
        .collect();

    let users = state
        .users
        .list_users()
        .await?
        .into_iter()
        .map(|user| {
            let role = roles.get(&user.role_id).cloned();
            ResolvedIdentity::join(user, role)
        })
        .collect();

    Ok(ApiResponse::success(users))
}

/// Assigning the Super-admin role, or editing an account that currently
/// holds it, needs Super-admin on top of `manage_users`.
pub async fn user_update(
    State(state): State<AppState>,
    Extension(actor): Extension<ResolvedIdentity>,
    id: Result<Path<UserId>, PathRejection>,
    payload: Result<Json<AdminUserUpdate>, JsonRejection>,
) -> ApiResult<ResolvedIdentity> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    if let Some(username) = &request.username {
        errors.check("username", validation::username(username));
    }
    if let Some(email) = &request.email {
        errors.check("email", validation::email(email));
    }
    errors.into_result()?;

    let target = state
        .users
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    if holds_super_admin(&state, target.role_id).await? {
        require_super_admin(&actor)?;
    }

    if let Some(role_id) = request.role {
        let role = state.roles.find_role(role_id).await?.ok_or_else(|| {
            let mut field_errors = HashMap::new();
            field_errors.insert("role".to_string(), "Role does not exist".to_string());
            ApiError::validation_error("Validation failed", Some(field_errors))
        })?;
        if role.is_super_admin() {
            require_super_admin(&actor)?;
        }
    }

    let update = UserUpdate {
        username: request.username.map(|u| u.trim().to_string()),
        email: request.email,
        role_id: request.role,
        status: request.status,
        ..Default::default()
    };

    let user = state
        .users
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let role = state.roles.find_role(user.role_id).await?;

    tracing::info!(actor = %actor.id, user_id = %user.id, "user updated");
    Ok(ApiResponse::success(ResolvedIdentity::join(user, role)))
}

pub async fn user_delete(
    State(state): State<AppState>,
    Extension(actor): Extension<ResolvedIdentity>,
    id: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Deleted<UserId>> {
    let Path(id) = id?;

    if id == actor.id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let target = state
        .users
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    if holds_super_admin(&state, target.role_id).await? {
        require_super_admin(&actor)?;
    }

    if !state.users.delete_user(id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(actor = %actor.id, user_id = %id, "user deleted");
    Ok(ApiResponse::success(Deleted { id, deleted: true }))
}

async fn holds_super_admin(state: &AppState, role_id: RoleId) -> Result<bool, ApiError> {
    Ok(state
        .roles
        .find_role(role_id)
        .await?
        .is_some_and(|role| role.is_super_admin()))
}
