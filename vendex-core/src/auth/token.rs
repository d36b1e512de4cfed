//! Session token codec
//!
//! Issues and verifies the signed HS256 tokens that carry a user's identity
//! and role claims between requests. The codec is stateless: everything it
//! needs is the signing secret injected at construction, so tests can run
//! with a distinct key per codec and services can rotate the secret by
//! rebuilding their codec.
//!
//! Expiry is deliberately not enforced at decode time. A token that fails
//! signature verification is worthless and [`TokenCodec::decode`] rejects it,
//! but an expired token still carries readable claims; whether it is still
//! acceptable is answered by [`TokenCodec::is_valid`]. Revocation is a
//! credential-store concern and is checked a level above, in
//! [`crate::auth::service::AuthService`].

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Fixed session token lifetime. A design parameter, not runtime
/// configuration.
pub const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Claim set carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username the token was issued to
    pub sub: String,
    /// Role names held by the subject at issuance, in deterministic order
    pub roles: Vec<String>,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
    /// Caller-supplied extra claims, flattened into the claim set
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret rejected: {0}")]
    InvalidSecret(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    /// Signature or format failure. Deliberately carries no detail so the
    /// caller cannot distinguish a forged token from a malformed one.
    #[error("Invalid token")]
    Invalid,
}

/// Encodes and verifies HS256 session tokens with an injected secret.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from a base64-encoded HMAC secret, as carried by the
    /// deployment configuration. A secret that is not valid base64 is a
    /// configuration defect surfaced as [`TokenError::InvalidSecret`].
    pub fn new(secret_base64: &str) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_base64_secret(secret_base64)
            .map_err(|err| TokenError::InvalidSecret(err.to_string()))?;
        let decoding_key = DecodingKey::from_base64_secret(secret_base64)
            .map_err(|err| TokenError::InvalidSecret(err.to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Expired tokens must still decode; expiry is an `is_valid` concern.
        validation.validate_exp = false;

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Issue a signed token for `subject` carrying `role_names` plus any
    /// caller-supplied extra claims. Pure apart from reading the clock.
    pub fn issue(
        &self,
        subject: &str,
        role_names: &[String],
        extra_claims: Map<String, Value>,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            roles: role_names.to_vec(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECONDS)).timestamp(),
            extra: extra_claims,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    /// Verify the signature and parse the claim set in one step.
    ///
    /// Fails with [`TokenError::Invalid`] on a bad signature or malformed
    /// token. Succeeds for expired tokens; see the module docs.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    /// True iff the token verifies, its subject equals `expected_subject`,
    /// and it has not expired. Does not consult the credential store; a
    /// revoked token can still be `is_valid` here.
    pub fn is_valid(&self, token: &str, expected_subject: &str) -> bool {
        match self.decode(token) {
            Ok(claims) => {
                claims.sub == expected_subject
                    && Utc::now().timestamp() < claims.exp
            }
            Err(_) => false,
        }
    }
}
