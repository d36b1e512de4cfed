//! Ports consumed by the auth workflows.
//!
//! The workflows depend on these traits only; PostgreSQL and in-memory
//! implementations live alongside in [`crate::store`]. All implementations
//! must be shareable across request tasks (`Send + Sync`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::users::{Role, User};

/// Persistence for [`User`] records and their role assignments.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Persist a new user together with its role assignments as one
    /// transactional unit.
    async fn create(&self, user: &User) -> Result<()>;

    /// Flip the account-enabled flag, bumping the update timestamp.
    async fn set_enabled(&self, user_id: Uuid, enabled: bool) -> Result<()>;
}

/// Persistence for [`Role`] records.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>>;

    async fn create(&self, name: &str) -> Result<Role>;
}

/// Persistence for issued session tokens, stored as HMAC digests.
#[async_trait]
pub trait IssuedTokenStore: Send + Sync {
    /// Revoke every active token for `user_id` and record `token_digest` as
    /// the sole active token, as one transactional unit. Concurrent logins
    /// for the same account serialize here; last write wins.
    async fn rotate_user_token(
        &self,
        user_id: Uuid,
        token_digest: &str,
    ) -> Result<()>;

    /// Whether `token_digest` belongs to a currently active (not revoked)
    /// issued token.
    async fn is_token_active(&self, token_digest: &str) -> Result<bool>;
}

/// A pending email-confirmation token, stored as an HMAC digest.
#[derive(Debug, Clone)]
pub struct ConfirmationTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Insert payload for a confirmation token.
#[derive(Debug, Clone)]
pub struct NewConfirmationToken {
    pub user_id: Uuid,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for email-confirmation tokens.
#[async_trait]
pub trait ConfirmationTokenStore: Send + Sync {
    async fn create(&self, token: NewConfirmationToken) -> Result<()>;

    /// Single-use consume: if `token_digest` matches an unconfirmed,
    /// unexpired token, mark it confirmed at `now` and return it.
    async fn consume(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ConfirmationTokenRecord>>;
}
