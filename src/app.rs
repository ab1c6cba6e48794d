use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{PasswordHasher, SessionIssuer, SessionTokens, SessionVerifier};
use crate::authz::{known, Requirement};
use crate::config::AppConfig;
use crate::database::{CredentialStore, RoleStore};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{authenticate, enforce};

/// Shared handles for every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub roles: Arc<dyn RoleStore>,
    pub passwords: PasswordHasher,
    pub issuer: Arc<SessionIssuer>,
    pub verifier: Arc<SessionVerifier>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        roles: Arc<dyn RoleStore>,
        tokens: SessionTokens,
        passwords: PasswordHasher,
    ) -> Self {
        let issuer = SessionIssuer::new(users.clone(), roles.clone(), tokens.clone(), passwords.clone());
        let verifier = SessionVerifier::new(users.clone(), roles.clone(), tokens);
        Self {
            users,
            roles,
            passwords,
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
        }
    }
}

/// Build the full router: public routes, then session-protected routes
/// grouped by the requirement each one declares.
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    match cors_layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/auth/signup", post(public::signup))
        .route("/api/auth/login", post(public::login))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, roles, users};

    let account = Router::new().route("/api/auth/me", get(auth::me_get).put(auth::me_put));

    let user_admin = Router::new()
        .route("/api/users", get(users::users_list))
        .route("/api/users/:id", put(users::user_update).delete(users::user_delete));

    let role_read = Router::new().route("/api/roles", get(roles::roles_list));

    let role_admin = Router::new()
        .route("/api/roles", post(roles::role_create))
        .route("/api/roles/:id", put(roles::role_update).delete(roles::role_delete));

    let super_admin = Router::new().route("/api/super-admin/rbac", get(elevated::rbac_report));

    Router::new()
        .merge(guarded(account, Requirement::Unrestricted))
        .merge(guarded(user_admin, Requirement::any_of([known::MANAGE_USERS])))
        .merge(guarded(
            role_read,
            Requirement::any_of([known::MANAGE_ROLES, known::MANAGE_USERS]),
        ))
        .merge(guarded(role_admin, Requirement::any_of([known::MANAGE_ROLES])))
        .merge(guarded(super_admin, Requirement::SuperAdminOnly))
        // Outermost route layer: resolve the session before any requirement runs.
        .route_layer(from_fn_with_state(state, authenticate))
}

/// Attach the gate for `requirement` to every route in `router`.
fn guarded(router: Router<AppState>, requirement: Requirement) -> Router<AppState> {
    router.route_layer(from_fn_with_state(requirement, enforce))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}
