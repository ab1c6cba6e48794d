// handlers/elevated/rbac.rs - GET /api/super-admin/rbac handler

use std::collections::HashMap;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::{Role, RoleId, UserId};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleMembership {
    #[serde(flatten)]
    pub role: Role,
    pub members: usize,
}

/// Roles with member counts, plus users whose role reference dangles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacReport {
    pub total_users: usize,
    pub roles: Vec<RoleMembership>,
    pub dangling_users: Vec<UserId>,
}

pub async fn rbac_report(State(state): State<AppState>) -> ApiResult<RbacReport> {
    let roles = state.roles.list_roles().await?;
    let users = state.users.list_users().await?;

    let mut members: HashMap<RoleId, usize> = HashMap::new();
    let mut dangling_users = Vec::new();
    for user in &users {
        if roles.iter().any(|role| role.id == user.role_id) {
            *members.entry(user.role_id).or_default() += 1;
        } else {
            dangling_users.push(user.id);
        }
    }

    let roles = roles
        .into_iter()
        .map(|role| RoleMembership {
            members: members.get(&role.id).copied().unwrap_or(0),
            role,
        })
        .collect();

    Ok(ApiResponse::success(RbacReport {
        total_users: users.len(),
        roles,
        dangling_users,
    }))
}
