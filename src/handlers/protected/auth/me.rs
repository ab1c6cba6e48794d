// handlers/protected/auth/me.rs - GET/PUT /api/auth/me handlers

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::ResolvedIdentity;
use crate::database::models::UserUpdate;
use crate::error::ApiError;
use crate::handlers::validation::{self, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};

/// The identity resolved for this request, role embedded.
pub async fn me_get(Extension(identity): Extension<ResolvedIdentity>) -> ApiResult<ResolvedIdentity> {
    Ok(ApiResponse::success(identity))
}

/// Self-service profile fields. Role and status are not among them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

pub async fn me_put(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<ResolvedIdentity> {
    let Json(profile) = payload?;

    let mut errors = FieldErrors::new();
    if let Some(username) = &profile.username {
        errors.check("username", validation::username(username));
    }
    if let Some(email) = &profile.email {
        errors.check("email", validation::email(email));
    }
    if let Some(password) = &profile.password {
        errors.check("password", validation::password(password));
    }
    errors.into_result()?;

    let password_hash = match &profile.password {
        Some(password) => Some(state.passwords.hash(password).await?),
        None => None,
    };

    let update = UserUpdate {
        username: profile.username.map(|u| u.trim().to_string()),
        email: profile.email,
        password_hash,
        ..Default::default()
    };

    let user = state
        .users
        .update_user(identity.id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let role = state.roles.find_role(user.role_id).await?;

    tracing::info!(user_id = %user.id, "profile updated");
    Ok(ApiResponse::success(ResolvedIdentity::join(user, role)))
}
