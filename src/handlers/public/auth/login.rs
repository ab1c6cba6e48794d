// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::IssuedSession;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Exchange email and password for a session token.
///
/// Unknown email, wrong password and inactive account all answer with the
/// same 401 "Invalid credentials".
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<IssuedSession> {
    let Json(request) = payload?;
    let session = state.issuer.login(&request.email, &request.password).await?;
    Ok(ApiResponse::success(session))
}
