use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use pressroom::app::{build_router, AppState};
use pressroom::auth::{PasswordHasher, SessionTokens};
use pressroom::config::config;
use pressroom::database::seed::{ensure_default_roles, ensure_super_admin};
use pressroom::database::{CredentialStore, DatabaseManager, MemoryStore, PgStore, RoleStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pressroom=info,tower_http=info".into()),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    config.validate().context("invalid configuration")?;
    info!("Starting Pressroom API in {:?} mode", config.environment);

    let (users, roles): (Arc<dyn CredentialStore>, Arc<dyn RoleStore>) = match &config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("connecting to database")?;
            let store = PgStore::new(pool);
            store.migrate().await.context("running schema migration")?;
            (Arc::new(store.clone()), Arc::new(store))
        }
        None => {
            info!("DATABASE_URL not set, using the in-memory store");
            let store = MemoryStore::new();
            (Arc::new(store.clone()), Arc::new(store))
        }
    };

    let passwords = PasswordHasher::new(config.security.bcrypt_cost).context("configuring password hashing")?;
    let tokens = SessionTokens::new(&config.security.jwt_secret);

    let (_, super_admin) = ensure_default_roles(roles.as_ref())
        .await
        .context("seeding default roles")?;
    ensure_super_admin(users.as_ref(), &super_admin, &config.seed, &passwords)
        .await
        .context("seeding super-admin account")?;

    let state = AppState::new(users, roles, tokens, passwords);
    let app = build_router(state, config);

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Pressroom API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
