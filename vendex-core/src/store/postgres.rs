//! PostgreSQL credential store.
//!
//! One repository per aggregate, all sharing a [`PgPool`]. Queries use the
//! runtime API with explicit row mapping so the crate builds without a
//! database connection.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::store::ports::{
    ConfirmationTokenRecord, ConfirmationTokenStore, IssuedTokenStore,
    NewConfirmationToken, RoleStore, UserStore,
};
use crate::users::{Gender, Role, User};

const USER_COLUMNS: &str = "id, full_name, username, email, password_hash, \
     gender, date_joined, updated_at, display_photo, business_name, enabled";

fn map_user_row(row: &PgRow) -> Result<User> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| CoreError::Internal(format!("Failed to read user id: {e}")))?;
    let full_name: String = row
        .try_get("full_name")
        .map_err(|e| CoreError::Internal(format!("Failed to read full_name: {e}")))?;
    let username: String = row
        .try_get("username")
        .map_err(|e| CoreError::Internal(format!("Failed to read username: {e}")))?;
    let email: String = row
        .try_get("email")
        .map_err(|e| CoreError::Internal(format!("Failed to read email: {e}")))?;
    let password_hash: String = row
        .try_get("password_hash")
        .map_err(|e| CoreError::Internal(format!("Failed to read password_hash: {e}")))?;
    let gender: String = row
        .try_get("gender")
        .map_err(|e| CoreError::Internal(format!("Failed to read gender: {e}")))?;
    let date_joined: DateTime<Utc> = row
        .try_get("date_joined")
        .map_err(|e| CoreError::Internal(format!("Failed to read date_joined: {e}")))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| CoreError::Internal(format!("Failed to read updated_at: {e}")))?;
    let display_photo: Option<String> = row
        .try_get("display_photo")
        .map_err(|e| CoreError::Internal(format!("Failed to read display_photo: {e}")))?;
    let business_name: Option<String> = row
        .try_get("business_name")
        .map_err(|e| CoreError::Internal(format!("Failed to read business_name: {e}")))?;
    let enabled: bool = row
        .try_get("enabled")
        .map_err(|e| CoreError::Internal(format!("Failed to read enabled: {e}")))?;

    Ok(User {
        id,
        full_name,
        username,
        email,
        password_hash,
        gender: Gender::from_str(&gender).map_err(CoreError::Internal)?,
        date_joined,
        updated_at,
        display_photo,
        business_name,
        enabled,
        roles: Vec::new(),
    })
}

fn map_role_row(row: &PgRow) -> Result<Role> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| CoreError::Internal(format!("Failed to read role id: {e}")))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| CoreError::Internal(format!("Failed to read role name: {e}")))?;

    Ok(Role { id, name })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// PostgreSQL-backed [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_roles(&self, user_id: Uuid) -> Result<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            CoreError::Database(format!("Failed to load user roles: {e}"))
        })?;

        rows.iter().map(map_role_row).collect()
    }

    async fn find_by_column(
        &self,
        query: &str,
        bind: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query(query)
            .bind(bind)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                CoreError::Database(format!("Failed to look up user: {e}"))
            })?;

        match row {
            Some(row) => {
                let mut user = map_user_row(&row)?;
                user.roles = self.load_roles(user.id).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_by_column(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"),
            username,
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_by_column(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"),
            email,
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            CoreError::Database(format!("Failed to look up user by id: {e}"))
        })?;

        match row {
            Some(row) => {
                let mut user = map_user_row(&row)?;
                user.roles = self.load_roles(user.id).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, user: &User) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            CoreError::Database(format!("Failed to start transaction: {e}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, full_name, username, email, password_hash,
                gender, date_joined, updated_at, display_photo,
                business_name, enabled
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.gender.to_string())
        .bind(user.date_joined)
        .bind(user.updated_at)
        .bind(&user.display_photo)
        .bind(&user.business_name)
        .bind(user.enabled)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict(format!(
                    "username or email already registered: {e}"
                ))
            } else {
                CoreError::Database(format!("Failed to insert user: {e}"))
            }
        })?;

        for role in &user.roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)",
            )
            .bind(user.id)
            .bind(role.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                CoreError::Database(format!("Failed to assign role: {e}"))
            })?;
        }

        tx.commit().await.map_err(|e| {
            CoreError::Database(format!("Failed to commit user insert: {e}"))
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, "user record created");
        Ok(())
    }

    async fn set_enabled(&self, user_id: Uuid, enabled: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET enabled = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(enabled)
        .execute(self.pool())
        .await
        .map_err(|e| {
            CoreError::Database(format!("Failed to update enabled flag: {e}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "no user with id {user_id}"
            )));
        }

        Ok(())
    }
}

/// PostgreSQL-backed [`RoleStore`].
#[derive(Debug, Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                CoreError::Database(format!("Failed to look up role: {e}"))
            })?;

        row.as_ref().map(map_role_row).transpose()
    }

    async fn create(&self, name: &str) -> Result<Role> {
        let row = sqlx::query(
            "INSERT INTO roles (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict(format!("role {name} already exists"))
            } else {
                CoreError::Database(format!("Failed to create role: {e}"))
            }
        })?;

        map_role_row(&row)
    }
}

/// PostgreSQL-backed [`IssuedTokenStore`].
#[derive(Debug, Clone)]
pub struct PgIssuedTokenStore {
    pool: PgPool,
}

impl PgIssuedTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IssuedTokenStore for PgIssuedTokenStore {
    async fn rotate_user_token(
        &self,
        user_id: Uuid,
        token_digest: &str,
    ) -> Result<()> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            CoreError::Database(format!("Failed to start transaction: {e}"))
        })?;

        sqlx::query(
            r#"
            UPDATE issued_tokens
            SET revoked = TRUE,
                revoked_at = NOW()
            WHERE user_id = $1
              AND revoked = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            CoreError::Database(format!("Failed to revoke prior tokens: {e}"))
        })?;

        sqlx::query(
            "INSERT INTO issued_tokens (user_id, token_digest) VALUES ($1, $2)",
        )
        .bind(user_id)
        .bind(token_digest)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            CoreError::Database(format!("Failed to save issued token: {e}"))
        })?;

        tx.commit().await.map_err(|e| {
            CoreError::Database(format!("Failed to commit token rotation: {e}"))
        })?;

        tracing::debug!(user_id = %user_id, "issued token rotated");
        Ok(())
    }

    async fn is_token_active(&self, token_digest: &str) -> Result<bool> {
        let active: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM issued_tokens
                WHERE token_digest = $1 AND revoked = FALSE
            )
            "#,
        )
        .bind(token_digest)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            CoreError::Database(format!("Failed to check token status: {e}"))
        })?;

        Ok(active)
    }
}

/// PostgreSQL-backed [`ConfirmationTokenStore`].
#[derive(Debug, Clone)]
pub struct PgConfirmationTokenStore {
    pool: PgPool,
}

impl PgConfirmationTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<ConfirmationTokenRecord> {
        let id: Uuid = row.try_get("id").map_err(|e| {
            CoreError::Internal(format!("Failed to read token id: {e}"))
        })?;
        let user_id: Uuid = row.try_get("user_id").map_err(|e| {
            CoreError::Internal(format!("Failed to read token user_id: {e}"))
        })?;
        let token_digest: String = row.try_get("token_digest").map_err(|e| {
            CoreError::Internal(format!("Failed to read token digest: {e}"))
        })?;
        let created_at: DateTime<Utc> =
            row.try_get("created_at").map_err(|e| {
                CoreError::Internal(format!("Failed to read created_at: {e}"))
            })?;
        let expires_at: DateTime<Utc> =
            row.try_get("expires_at").map_err(|e| {
                CoreError::Internal(format!("Failed to read expires_at: {e}"))
            })?;
        let confirmed_at: Option<DateTime<Utc>> =
            row.try_get("confirmed_at").map_err(|e| {
                CoreError::Internal(format!("Failed to read confirmed_at: {e}"))
            })?;

        Ok(ConfirmationTokenRecord {
            id,
            user_id,
            token_digest,
            created_at,
            expires_at,
            confirmed_at,
        })
    }
}

#[async_trait]
impl ConfirmationTokenStore for PgConfirmationTokenStore {
    async fn create(&self, token: NewConfirmationToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO confirmation_tokens (user_id, token_digest, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token.user_id)
        .bind(&token.token_digest)
        .bind(token.expires_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            CoreError::Database(format!(
                "Failed to create confirmation token: {e}"
            ))
        })?;

        Ok(())
    }

    async fn consume(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ConfirmationTokenRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE confirmation_tokens
            SET confirmed_at = $2
            WHERE token_digest = $1
              AND confirmed_at IS NULL
              AND expires_at > $2
            RETURNING
                id,
                user_id,
                token_digest,
                created_at,
                expires_at,
                confirmed_at
            "#,
        )
        .bind(token_digest)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            CoreError::Database(format!(
                "Failed to consume confirmation token: {e}"
            ))
        })?;

        row.as_ref().map(Self::map_row).transpose()
    }
}
