//! In-memory credential store.
//!
//! Backs the auth workflows in tests and in the dev profile where no
//! database is configured. A single struct implements every store port so
//! one instance can be shared behind each `Arc<dyn …>` seam.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::store::ports::{
    ConfirmationTokenRecord, ConfirmationTokenStore, IssuedTokenStore,
    NewConfirmationToken, RoleStore, UserStore,
};
use crate::users::{Role, User};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    roles: Vec<Role>,
    issued: Vec<IssuedEntry>,
    confirmations: Vec<ConfirmationTokenRecord>,
}

#[derive(Debug, Clone)]
struct IssuedEntry {
    user_id: Uuid,
    token_digest: String,
    revoked: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users; inspection helper for tests.
    pub fn user_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").users.len()
    }

    /// Number of active (not revoked) issued tokens for a user; inspection
    /// helper for tests.
    pub fn active_tokens_for(&self, user_id: Uuid) -> usize {
        self.inner
            .read()
            .expect("lock poisoned")
            .issued
            .iter()
            .filter(|entry| entry.user_id == user_id && !entry.revoked)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.users.iter().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.users.iter().find(|user| user.id == id).cloned())
    }

    async fn create(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(CoreError::Conflict(
                "username or email already registered".to_string(),
            ));
        }
        // Same read-back order as the SQL store (roles ordered by name).
        let mut user = user.clone();
        user.roles.sort_by(|a, b| a.name.cmp(&b.name));
        inner.users.push(user);
        Ok(())
    }

    async fn set_enabled(&self, user_id: Uuid, enabled: bool) -> Result<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        let user = inner
            .users
            .iter_mut()
            .find(|user| user.id == user_id)
            .ok_or_else(|| {
                CoreError::NotFound(format!("no user with id {user_id}"))
            })?;
        user.enabled = enabled;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.roles.iter().find(|role| role.name == name).cloned())
    }

    async fn create(&self, name: &str) -> Result<Role> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner.roles.iter().any(|role| role.name == name) {
            return Err(CoreError::Conflict(format!(
                "role {name} already exists"
            )));
        }
        let role = Role {
            id: Uuid::now_v7(),
            name: name.to_string(),
        };
        inner.roles.push(role.clone());
        Ok(role)
    }
}

#[async_trait]
impl IssuedTokenStore for MemoryStore {
    async fn rotate_user_token(
        &self,
        user_id: Uuid,
        token_digest: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        for entry in inner
            .issued
            .iter_mut()
            .filter(|entry| entry.user_id == user_id)
        {
            entry.revoked = true;
        }
        inner.issued.push(IssuedEntry {
            user_id,
            token_digest: token_digest.to_string(),
            revoked: false,
        });
        Ok(())
    }

    async fn is_token_active(&self, token_digest: &str) -> Result<bool> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner
            .issued
            .iter()
            .any(|entry| entry.token_digest == token_digest && !entry.revoked))
    }
}

#[async_trait]
impl ConfirmationTokenStore for MemoryStore {
    async fn create(&self, token: NewConfirmationToken) -> Result<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.confirmations.push(ConfirmationTokenRecord {
            id: Uuid::now_v7(),
            user_id: token.user_id,
            token_digest: token.token_digest,
            created_at: Utc::now(),
            expires_at: token.expires_at,
            confirmed_at: None,
        });
        Ok(())
    }

    async fn consume(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ConfirmationTokenRecord>> {
        let mut inner = self.inner.write().expect("lock poisoned");
        let record = inner.confirmations.iter_mut().find(|record| {
            record.token_digest == token_digest
                && record.confirmed_at.is_none()
                && record.expires_at > now
        });

        match record {
            Some(record) => {
                record.confirmed_at = Some(now);
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }
}
