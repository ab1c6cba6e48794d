use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info};

use crate::app::AppState;
use crate::auth::ResolvedIdentity;
use crate::authz::{decide, Decision, Requirement};
use crate::error::{ApiError, NOT_AUTHORIZED};

/// Resolve the bearer token to a live identity and attach it to the request.
///
/// A missing header, a malformed scheme, a bad or expired token, a deleted or
/// inactive account: all fail with the same 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).ok_or_else(|| {
        debug!("request without a usable bearer token");
        ApiError::unauthorized(NOT_AUTHORIZED)
    })?;

    let identity = state.verifier.resolve(token).await.map_err(|e| {
        debug!(cause = e.cause(), "session token rejected");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Run the gate for the route's declared requirement. Must be layered inside
/// `authenticate`; without a resolved identity the request is refused, never
/// judged.
pub async fn enforce(
    State(requirement): State<Requirement>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<ResolvedIdentity>()
        .ok_or_else(|| ApiError::unauthorized(NOT_AUTHORIZED))?;

    match decide(identity, &requirement) {
        Decision::Allow => Ok(next.run(request).await),
        Decision::Deny(denial) => {
            info!(
                user_id = %identity.id,
                role = identity.role_name().unwrap_or("<missing>"),
                requirement = %requirement,
                path = %request.uri().path(),
                "request denied"
            );
            Err(ApiError::forbidden(denial.to_string()))
        }
    }
}

/// Accepts exactly `<scheme> <token>` with a case-insensitive `Bearer` scheme.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;

    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}
