#![cfg(feature = "pg-tests")]
//! PostgreSQL store tests against a real database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test --features pg-tests --test 40_pg_store`.
//! Each test migrates into its own schema and drops it afterwards.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use pressroom::authz::PermissionSet;
use pressroom::database::models::{AccountStatus, NewRole, NewUser, RoleId, RoleUpdate, UserUpdate};
use pressroom::database::{CredentialStore, PgStore, RoleStore, StoreError};

struct PgFixture {
    store: PgStore,
    admin: PgPool,
    schema: String,
}

impl PgFixture {
    async fn new() -> Result<Self> {
        let url = std::env::var("DATABASE_URL").context("DATABASE_URL must point at a scratch database")?;
        let schema = format!("pressroom_test_{}", uuid::Uuid::new_v4().simple());

        let admin = PgPoolOptions::new().max_connections(1).connect(&url).await?;
        sqlx::query(&format!("CREATE SCHEMA {}", schema)).execute(&admin).await?;

        let search_path = schema.clone();
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .after_connect(move |conn, _meta| {
                let statement = format!("SET search_path TO {}", search_path);
                Box::pin(async move {
                    sqlx::query(&statement).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await?;

        let store = PgStore::new(pool);
        store.migrate().await?;
        Ok(Self { store, admin, schema })
    }

    async fn teardown(self) -> Result<()> {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await?;
        Ok(())
    }
}

fn permissions(names: &[&str]) -> PermissionSet {
    PermissionSet::parse(names.iter().copied()).expect("valid permissions")
}

fn new_role(name: &str, names: &[&str]) -> NewRole {
    NewRole {
        name: name.to_string(),
        description: format!("{} role", name),
        permissions: permissions(names),
    }
}

fn new_user(email: &str, role_id: RoleId) -> NewUser {
    NewUser {
        username: "writer".into(),
        email: email.to_string(),
        password_hash: "$2b$04$fixture".into(),
        status: AccountStatus::Active,
        role_id,
    }
}

#[tokio::test]
async fn migrate_is_idempotent() -> Result<()> {
    let pg = PgFixture::new().await?;
    pg.store.migrate().await?;
    pg.store.ping().await?;
    pg.teardown().await
}

#[tokio::test]
async fn permissions_round_trip_through_text_arrays() -> Result<()> {
    let pg = PgFixture::new().await?;
    let created = pg.store.insert_role(new_role("Editor", &["manage_posts", "create_post"])).await?;

    let found = pg.store.find_role(created.id).await?.context("role missing")?;
    assert_eq!(found, created);
    assert_eq!(found.permissions, permissions(&["create_post", "manage_posts"]));

    let by_name = pg.store.find_role_by_name("Editor").await?.context("role missing")?;
    assert_eq!(by_name.id, created.id);

    let empty = pg.store.insert_role(new_role("Reader", &[])).await?;
    assert!(pg.store.find_role(empty.id).await?.context("role missing")?.permissions.is_empty());
    pg.teardown().await
}

#[tokio::test]
async fn unique_violations_become_conflicts() -> Result<()> {
    let pg = PgFixture::new().await?;
    let role = pg.store.insert_role(new_role("Editor", &[])).await?;

    let duplicate_role = pg.store.insert_role(new_role("Editor", &["manage_posts"])).await;
    assert!(matches!(duplicate_role, Err(StoreError::Conflict { entity: "role", .. })));

    let other = pg.store.insert_role(new_role("Reviewer", &[])).await?;
    let rename = RoleUpdate {
        name: Some("Editor".into()),
        ..Default::default()
    };
    assert!(matches!(
        pg.store.update_role(other.id, rename).await,
        Err(StoreError::Conflict { entity: "role", .. })
    ));

    pg.store.insert_user(new_user("ada@example.com", role.id)).await?;
    let duplicate_user = pg.store.insert_user(new_user("ada@example.com", role.id)).await;
    assert!(matches!(duplicate_user, Err(StoreError::Conflict { entity: "user", .. })));

    let grace = pg.store.insert_user(new_user("grace@example.com", role.id)).await?;
    let steal = UserUpdate {
        email: Some("ada@example.com".into()),
        ..Default::default()
    };
    assert!(matches!(
        pg.store.update_user(grace.id, steal).await,
        Err(StoreError::Conflict { entity: "user", .. })
    ));
    pg.teardown().await
}

#[tokio::test]
async fn partial_updates_keep_unset_columns() -> Result<()> {
    let pg = PgFixture::new().await?;
    let role = pg.store.insert_role(new_role("Editor", &["manage_posts"])).await?;

    let described = RoleUpdate {
        description: Some("Edits posts".into()),
        ..Default::default()
    };
    let role = pg.store.update_role(role.id, described).await?.context("role missing")?;
    assert_eq!(role.name, "Editor");
    assert_eq!(role.description, "Edits posts");
    assert_eq!(role.permissions, permissions(&["manage_posts"]));

    let user = pg.store.insert_user(new_user("ada@example.com", role.id)).await?;
    let deactivate = UserUpdate {
        status: Some(AccountStatus::Inactive),
        ..Default::default()
    };
    let updated = pg.store.update_user(user.id, deactivate).await?.context("user missing")?;
    assert_eq!(updated.status, AccountStatus::Inactive);
    assert_eq!(updated.username, user.username);
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.password_hash, user.password_hash);
    assert_eq!(updated.role_id, role.id);
    assert!(updated.updated_at >= user.updated_at);

    let missing = pg.store.update_user(pressroom::database::models::UserId::new(), UserUpdate::default()).await?;
    assert!(missing.is_none());
    pg.teardown().await
}

#[tokio::test]
async fn deleting_a_role_leaves_a_dangling_reference() -> Result<()> {
    let pg = PgFixture::new().await?;
    let role = pg.store.insert_role(new_role("Editor", &["manage_posts"])).await?;
    let user = pg.store.insert_user(new_user("ada@example.com", role.id)).await?;

    assert!(pg.store.delete_role(role.id).await?);
    assert!(!pg.store.delete_role(role.id).await?);

    let user = pg.store.find_user(user.id).await?.context("user missing")?;
    assert_eq!(user.role_id, role.id);
    assert!(pg.store.find_role(user.role_id).await?.is_none());

    // Users may also be created against a role that never existed.
    let orphan = pg.store.insert_user(new_user("grace@example.com", RoleId::new())).await?;
    assert!(pg.store.find_role(orphan.role_id).await?.is_none());
    assert_eq!(pg.store.list_users().await?.len(), 2);

    assert!(pg.store.delete_user(orphan.id).await?);
    assert!(pg.store.find_user(orphan.id).await?.is_none());
    pg.teardown().await
}
