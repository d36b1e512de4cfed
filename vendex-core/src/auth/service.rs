//! Registration, login, email confirmation, and bearer authorization.
//!
//! [`AuthService`] orchestrates the credential store ports, the password
//! crypto, the token codec, and the mailer. It owns no state of its own;
//! everything is injected so the workflows run identically against
//! PostgreSQL and the in-memory store.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::auth::confirmation::{self, confirmation_ttl};
use crate::auth::crypto::AuthCrypto;
use crate::auth::token::{TokenCodec, TokenError};
use crate::error::CoreError;
use crate::mailer::{
    EmailDetails, MailError, Mailer, SUBJECT_REGISTRATION,
    TEMPLATE_EMAIL_VERIFICATION,
};
use crate::store::ports::{
    ConfirmationTokenStore, IssuedTokenStore, NewConfirmationToken, RoleStore,
    UserStore,
};
use crate::users::{LoginRequest, RegisterRequest, User, roles};

/// Workflow failures surfaced to the HTTP boundary.
///
/// Registration failures are deliberately unified here: the email-domain
/// check is an error variant like any other, never a sentinel string.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email domain")]
    InvalidEmailDomain,

    #[error("Email already exists. Login to your account!")]
    EmailExists,

    #[error("Username already exists. Choose another username!")]
    UsernameTaken,

    /// The bootstrap seeder did not run; a deployment defect, not a
    /// user-facing condition.
    #[error("default role {} missing from the credential store", roles::USER)]
    MissingDefaultRole,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User account is not enabled, please check your email to enable it")]
    AccountDisabled,

    #[error("Invalid or expired confirmation token")]
    InvalidConfirmationToken,

    #[error("verification email could not be sent: {0}")]
    MailDelivery(#[from] MailError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] CoreError),
}

/// Confirmation-pending result of a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub user_id: Uuid,
    pub email: String,
    pub message: String,
}

/// Result of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub username: String,
    pub token: String,
    pub profile_picture: Option<String>,
    pub roles: Vec<String>,
    pub message: String,
}

/// Public identity attached to a request after bearer authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub display_photo: Option<String>,
    pub business_name: Option<String>,
    pub roles: Vec<String>,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            display_photo: user.display_photo.clone(),
            business_name: user.business_name.clone(),
            roles: user.role_names(),
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    issued_tokens: Arc<dyn IssuedTokenStore>,
    confirmation_tokens: Arc<dyn ConfirmationTokenStore>,
    crypto: Arc<AuthCrypto>,
    codec: Arc<TokenCodec>,
    mailer: Arc<dyn Mailer>,
    base_url: Url,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("users_refs", &Arc::strong_count(&self.users))
            .field("roles_refs", &Arc::strong_count(&self.roles))
            .field(
                "issued_tokens_refs",
                &Arc::strong_count(&self.issued_tokens),
            )
            .field(
                "confirmation_tokens_refs",
                &Arc::strong_count(&self.confirmation_tokens),
            )
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        issued_tokens: Arc<dyn IssuedTokenStore>,
        confirmation_tokens: Arc<dyn ConfirmationTokenStore>,
        crypto: Arc<AuthCrypto>,
        codec: Arc<TokenCodec>,
        mailer: Arc<dyn Mailer>,
        base_url: Url,
    ) -> Self {
        Self {
            users,
            roles,
            issued_tokens,
            confirmation_tokens,
            crypto,
            codec,
            mailer,
            base_url,
        }
    }

    /// Register a new account.
    ///
    /// Uniqueness checks run in a fixed order (email before username) so a
    /// request that collides on both reports the email conflict. On success
    /// the account is persisted disabled with the default role and exactly
    /// one verification email is dispatched.
    ///
    /// A mail failure is reported to the caller but does not roll back the
    /// user row or the confirmation token; the account simply stays
    /// unconfirmed until a new link is requested out of band.
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<RegistrationOutcome, AuthError> {
        if !email_domain_is_valid(&request.email) {
            return Err(AuthError::InvalidEmailDomain);
        }

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }

        if self
            .users
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let default_role = self
            .roles
            .find_by_name(roles::USER)
            .await?
            .ok_or(AuthError::MissingDefaultRole)?;

        let password_hash =
            self.crypto.hash_password(&request.password).map_err(|err| {
                CoreError::Internal(format!("password hashing failed: {err}"))
            })?;

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            full_name: request.full_name,
            username: request.username,
            email: request.email,
            password_hash,
            gender: request.gender,
            date_joined: now,
            updated_at: now,
            display_photo: None,
            business_name: None,
            enabled: false,
            roles: vec![default_role],
        };

        self.users.create(&user).await?;

        let confirmation_token =
            confirmation::issue_token().map_err(|err| {
                CoreError::Internal(format!(
                    "confirmation token generation failed: {err}"
                ))
            })?;
        self.confirmation_tokens
            .create(NewConfirmationToken {
                user_id: user.id,
                token_digest: self.crypto.hash_token(&confirmation_token),
                expires_at: now + confirmation_ttl(),
            })
            .await?;

        let link =
            confirmation::verification_url(&self.base_url, &confirmation_token);
        let details = EmailDetails {
            recipient: user.email.clone(),
            full_name: user.full_name.clone(),
            subject: SUBJECT_REGISTRATION.to_string(),
            link: link.into(),
        };
        self.mailer
            .send(details, TEMPLATE_EMAIL_VERIFICATION)
            .await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            "registration accepted, confirmation pending"
        );

        Ok(RegistrationOutcome {
            user_id: user.id,
            email: user.email,
            message: "Registration successful. Check your email to confirm your account.".to_string(),
        })
    }

    /// Authenticate credentials and issue a fresh session token.
    ///
    /// Unknown usernames and wrong passwords both come back as
    /// [`AuthError::InvalidCredentials`] so the response never reveals
    /// which factor failed. The password is verified against the one row
    /// fetched here, and the issued-token rotation leaves exactly one
    /// active token for the account.
    pub async fn login(
        &self,
        request: LoginRequest,
    ) -> Result<LoginResponse, AuthError> {
        let user = self
            .users
            .find_by_username(&request.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = self
            .crypto
            .verify_password(&request.password, &user.password_hash)
            .map_err(|err| {
                CoreError::Internal(format!(
                    "password verification failed: {err}"
                ))
            })?;
        if !verified {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.enabled {
            return Err(AuthError::AccountDisabled);
        }

        let role_names = user.role_names();
        let token = self.codec.issue(&user.username, &role_names, Map::new())?;

        self.issued_tokens
            .rotate_user_token(user.id, &self.crypto.hash_token(&token))
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "login succeeded");

        Ok(LoginResponse {
            id: user.id,
            username: user.username,
            token,
            profile_picture: user.display_photo,
            roles: role_names,
            message: "Login Success".to_string(),
        })
    }

    /// Consume a confirmation token and enable the account it belongs to.
    ///
    /// Single-use: a second call with the same token fails, as does an
    /// expired or unknown one.
    pub async fn confirm_email(&self, token: &str) -> Result<Uuid, AuthError> {
        let digest = self.crypto.hash_token(token);
        let record = self
            .confirmation_tokens
            .consume(&digest, Utc::now())
            .await?
            .ok_or(AuthError::InvalidConfirmationToken)?;

        self.users.set_enabled(record.user_id, true).await?;

        tracing::info!(user_id = %record.user_id, "email confirmed, account enabled");
        Ok(record.user_id)
    }

    /// Authorize a bearer token and resolve the account behind it.
    ///
    /// The token must carry a good signature, be unexpired, and still be
    /// the account's active issued token; login rotation invalidates
    /// everything older. An active token whose subject no longer resolves
    /// to a user is a store inconsistency and surfaces as an internal
    /// error, not an authorization failure.
    pub async fn authorize_bearer(
        &self,
        token: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.codec.decode(token)?;
        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Invalid.into());
        }

        let digest = self.crypto.hash_token(token);
        if !self.issued_tokens.is_token_active(&digest).await? {
            return Err(TokenError::Invalid.into());
        }

        let user = self
            .users
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "active token for unknown subject {}",
                    claims.sub
                ))
            })?;

        Ok(AuthenticatedUser::from(&user))
    }
}

/// Post-boundary email check: exactly one `@` separating non-empty parts,
/// and a dotted domain whose final label (the TLD) is at least two
/// characters long.
fn email_domain_is_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((leading, tld)) => !leading.is_empty() && tld.len() >= 2,
        None => false,
    }
}
