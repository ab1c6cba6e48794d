use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::authz::PermissionSet;

use super::models::user::normalize_email;
use super::models::{NewRole, NewUser, Role, RoleId, RoleUpdate, UserId, UserRecord, UserUpdate};
use super::store::{CredentialStore, RoleStore, StoreError};

/// Schema statements, run one at a time by `migrate`.
///
/// `users.role_id` has no foreign key: a deleted role leaves its users with a
/// dangling reference, which the verifier resolves to zero permissions.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS roles (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        permissions TEXT[] NOT NULL DEFAULT '{}'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active',
        role_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS users_role_id_idx ON users (role_id)",
];

const USER_COLUMNS: &str = "id, username, email, password_hash, status, role_id, created_at, updated_at";
const ROLE_COLUMNS: &str = "id, name, description, permissions";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    status: String,
    role_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|e: String| StoreError::corrupt("user", e))?;
        Ok(UserRecord {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            status,
            role_id: RoleId::from_uuid(row.role_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: String,
    permissions: Vec<String>,
}

impl TryFrom<RoleRow> for Role {
    type Error = StoreError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let permissions = PermissionSet::parse(row.permissions)
            .map_err(|e| StoreError::corrupt("role", format!("{}: {}", row.name, e)))?;
        Ok(Role {
            id: RoleId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            permissions,
        })
    }
}

/// PostgreSQL-backed credential and role store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes when missing.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn map_unique(entity: &'static str, detail: String) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::conflict(entity, detail);
            }
        }
        StoreError::Sqlx(err)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(UserRecord::try_from)
            .collect()
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = user.into_record(UserId::new(), Utc::now());
        let sql = format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            USER_COLUMNS, USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(record.id.as_uuid())
            .bind(&record.username)
            .bind(&record.email)
            .bind(&record.password_hash)
            .bind(record.status.as_str())
            .bind(record.role_id.as_uuid())
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique("user", format!("email '{}'", record.email)))?
            .try_into()
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<UserRecord>, StoreError> {
        let email = update.email.as_deref().map(normalize_email);
        let sql = format!(
            "UPDATE users SET \
                username = COALESCE($2, username), \
                email = COALESCE($3, email), \
                password_hash = COALESCE($4, password_hash), \
                status = COALESCE($5, status), \
                role_id = COALESCE($6, role_id), \
                updated_at = $7 \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_uuid())
            .bind(update.username)
            .bind(email.clone())
            .bind(update.password_hash)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.role_id.map(|r| *r.as_uuid()))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique("user", format!("email '{}'", email.unwrap_or_default())))?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        super::manager::DatabaseManager::health_check(&self.pool).await
    }
}

#[async_trait]
impl RoleStore for PgStore {
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        let sql = format!("SELECT {} FROM roles WHERE id = $1", ROLE_COLUMNS);
        sqlx::query_as::<_, RoleRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(Role::try_from)
            .transpose()
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let sql = format!("SELECT {} FROM roles WHERE name = $1", ROLE_COLUMNS);
        sqlx::query_as::<_, RoleRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(Role::try_from)
            .transpose()
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let sql = format!("SELECT {} FROM roles ORDER BY name", ROLE_COLUMNS);
        sqlx::query_as::<_, RoleRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Role::try_from)
            .collect()
    }

    async fn insert_role(&self, role: NewRole) -> Result<Role, StoreError> {
        let role = role.into_role(RoleId::new());
        let sql = format!(
            "INSERT INTO roles ({}) VALUES ($1, $2, $3, $4) RETURNING {}",
            ROLE_COLUMNS, ROLE_COLUMNS
        );
        sqlx::query_as::<_, RoleRow>(&sql)
            .bind(role.id.as_uuid())
            .bind(&role.name)
            .bind(&role.description)
            .bind(role.permissions.names())
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique("role", format!("name '{}'", role.name)))?
            .try_into()
    }

    async fn update_role(&self, id: RoleId, update: RoleUpdate) -> Result<Option<Role>, StoreError> {
        let name = update.name.as_deref().map(|n| n.trim().to_string());
        let sql = format!(
            "UPDATE roles SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                permissions = COALESCE($4, permissions) \
             WHERE id = $1 RETURNING {}",
            ROLE_COLUMNS
        );
        sqlx::query_as::<_, RoleRow>(&sql)
            .bind(id.as_uuid())
            .bind(name.clone())
            .bind(update.description)
            .bind(update.permissions.map(|p| p.names()))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique("role", format!("name '{}'", name.unwrap_or_default())))?
            .map(Role::try_from)
            .transpose()
    }

    async fn delete_role(&self, id: RoleId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
