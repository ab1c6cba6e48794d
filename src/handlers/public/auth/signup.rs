// handlers/public/auth/signup.rs - POST /api/auth/signup handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::auth::{IssuedSession, NewAccount};
use crate::handlers::validation::{self, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};

/// Create an account with the default role and sign it in (201).
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> ApiResult<IssuedSession> {
    let Json(account) = payload?;

    let mut errors = FieldErrors::new();
    errors
        .check("username", validation::username(&account.username))
        .check("email", validation::email(&account.email))
        .check("password", validation::password(&account.password));
    errors.into_result()?;

    let session = state.issuer.signup(account).await?;
    Ok(ApiResponse::created(session))
}
