//! Email-confirmation tokens.
//!
//! Registration leaves the account disabled until the user follows a mailed
//! verification link. The link carries an opaque single-use token; only its
//! HMAC digest reaches the credential store, so a leaked database row cannot
//! be replayed as a working link.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Duration;
use rand::{TryRngCore, rngs::OsRng};
use thiserror::Error;
use url::Url;

/// Confirmation links stay valid for the same window as session tokens.
pub const CONFIRMATION_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Lifetime of a confirmation token as a [`chrono::Duration`].
pub fn confirmation_ttl() -> Duration {
    Duration::seconds(CONFIRMATION_TTL_SECONDS)
}

#[derive(Debug, Error)]
pub enum ConfirmationTokenError {
    #[error("Token generation failed")]
    GenerationFailed,
}

/// Generate an opaque confirmation token: 256 bits from the OS RNG,
/// URL-safe base64 without padding so it can ride in a query string.
pub fn issue_token() -> Result<String, ConfirmationTokenError> {
    let mut token_bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut token_bytes)
        .map_err(|_| ConfirmationTokenError::GenerationFailed)?;

    Ok(URL_SAFE_NO_PAD.encode(token_bytes))
}

/// Build the verification URL mailed to a new registrant.
pub fn verification_url(base: &Url, token: &str) -> Url {
    let mut url = base.clone();
    {
        let mut segments =
            url.path_segments_mut().expect("base URL cannot be opaque");
        segments.pop_if_empty();
        segments.extend(["api", "v1", "auth", "confirm"]);
    }
    url.query_pairs_mut().clear().append_pair("token", token);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = issue_token().unwrap();
        let b = issue_token().unwrap();
        assert_ne!(a, b);
        assert!(URL_SAFE_NO_PAD.decode(&a).is_ok());
    }

    #[test]
    fn builds_verification_url() {
        let base = Url::parse("https://shop.example.com").unwrap();
        let url = verification_url(&base, "abc123");
        assert_eq!(
            url.as_str(),
            "https://shop.example.com/api/v1/auth/confirm?token=abc123"
        );
    }

    #[test]
    fn verification_url_keeps_base_path() {
        let base = Url::parse("https://example.com/vendex/").unwrap();
        let url = verification_url(&base, "t0k3n");
        assert_eq!(
            url.as_str(),
            "https://example.com/vendex/api/v1/auth/confirm?token=t0k3n"
        );
    }
}
