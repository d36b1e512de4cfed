//! Account entities and request validation
//!
//! This module provides the core types for user management in Vendex:
//! the [`User`] and [`Role`] entities persisted by the credential store,
//! and the boundary payloads ([`RegisterRequest`], [`LoginRequest`]) with
//! their shape validation.
//!
//! ## Account Lifecycle
//!
//! 1. **Registration**: a user registers with profile details and a password;
//!    the account is created disabled with the default `USER` role
//! 2. **Confirmation**: a mailed confirmation link enables the account
//! 3. **Login**: credentials are verified and a signed session token is
//!    issued; prior tokens for the account are revoked
//!
//! ## Security
//!
//! - Passwords are hashed using Argon2id and never serialized
//! - Session tokens are HMAC-hashed before persistence
//!
//! ## Example
//!
//! ```no_run
//! use vendex_core::users::{Gender, LoginRequest, RegisterRequest};
//!
//! let register = RegisterRequest {
//!     full_name: "Alice Smith".to_string(),
//!     email: "alice@example.com".to_string(),
//!     username: "alice99".to_string(),
//!     password: "Str0ng@pass".to_string(),
//!     gender: Gender::Female,
//! };
//!
//! let login = LoginRequest {
//!     username: "alice99".to_string(),
//!     password: "Str0ng@pass".to_string(),
//! };
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Core user type for authentication and profile management
///
/// Represents a registered account in the Vendex system. The password hash
/// is never serialized to prevent accidental exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Full legal name shown on invoices and in the storefront
    pub full_name: String,
    /// Unique login name (alphanumeric, at least one letter and one digit)
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Argon2id password hash (never serialized)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Self-reported gender
    pub gender: Gender,
    /// Timestamp of account creation
    pub date_joined: DateTime<Utc>,
    /// Timestamp of last profile update
    pub updated_at: DateTime<Utc>,
    /// Optional reference to the user's display photo
    pub display_photo: Option<String>,
    /// Optional business name for merchant accounts
    pub business_name: Option<String>,
    /// Whether the account has completed email confirmation
    pub enabled: bool,
    /// Roles assigned to the account
    pub roles: Vec<Role>,
}

impl User {
    /// Role names for this account in deterministic (lexicographic) order,
    /// as embedded in session token claims.
    pub fn role_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.roles.iter().map(|role| role.name.clone()).collect();
        names.sort();
        names
    }

    /// Whether the account holds the named role.
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|role| role.name == role_name)
    }
}

/// Self-reported gender recorded at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "MALE"),
            Self::Female => write!(f, "FEMALE"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "OTHER" => Ok(Self::Other),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// A named permission grouping assigned to users
///
/// Roles are created by the bootstrap seeder and immutable afterwards;
/// only their assignment to users changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier
    pub id: Uuid,
    /// Unique role name (e.g., "USER", "ADMIN")
    pub name: String,
}

/// Well-known role names
pub mod roles {
    pub const ADMIN: &str = "ADMIN";
    pub const USER: &str = "USER";
}

/// Login request payload
///
/// # Example
///
/// ```json
/// {
///   "username": "alice99",
///   "password": "Str0ng@pass"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username the account was registered under
    pub username: String,
    /// Plain text password (verified against the stored hash)
    pub password: String,
}

/// Registration request payload
///
/// Username and email must be unique across the platform. The payload is
/// shape-validated at the boundary via [`RegisterRequest::validate`];
/// the registration workflow re-checks the email domain and uniqueness.
///
/// # Example
///
/// ```json
/// {
///   "fullName": "Alice Smith",
///   "email": "alice@example.com",
///   "username": "alice99",
///   "password": "Str0ng@pass",
///   "gender": "FEMALE"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Full name (letters and spaces only)
    pub full_name: String,
    /// Email address
    pub email: String,
    /// Desired username (alphanumeric with at least one letter and one digit)
    pub username: String,
    /// Plain text password
    pub password: String,
    /// Self-reported gender
    pub gender: Gender,
}

/// Validation errors for user input
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid full name: letters and spaces only, must not be blank")]
    InvalidFullName,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error(
        "Invalid username: alphanumeric with at least one letter and one digit"
    )]
    InvalidUsername,

    #[error(
        "Invalid password: minimum 8 characters with upper, lower, digit, and one of @$%*?&"
    )]
    InvalidPassword,
}

/// Characters accepted as the password's special-character class.
const PASSWORD_SPECIALS: &[char] = &['@', '$', '%', '*', '?', '&'];

impl RegisterRequest {
    /// Validate the registration payload shape.
    ///
    /// Covers the boundary constraints only; uniqueness and the email-domain
    /// check belong to the registration workflow.
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Full name: non-blank, letters and spaces
        if self.full_name.trim().is_empty()
            || !self
                .full_name
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c == ' ')
        {
            return Err(ValidationError::InvalidFullName);
        }

        // Email: non-blank, one '@' with non-empty local and domain parts
        let email = self.email.trim();
        match email.rsplit_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(ValidationError::InvalidEmail),
        }

        // Username: alphanumeric, at least one letter and one digit
        if self.username.is_empty()
            || !self.username.chars().all(|c| c.is_ascii_alphanumeric())
            || !self.username.chars().any(|c| c.is_ascii_alphabetic())
            || !self.username.chars().any(|c| c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidUsername);
        }

        // Password: 8+ chars from the allowed set, with one of each class
        if self.password.len() < 8 {
            return Err(ValidationError::InvalidPassword);
        }
        let allowed = |c: char| {
            c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(&c)
        };
        if !self.password.chars().all(allowed)
            || !self.password.chars().any(|c| c.is_ascii_uppercase())
            || !self.password.chars().any(|c| c.is_ascii_lowercase())
            || !self.password.chars().any(|c| c.is_ascii_digit())
            || !self
                .password
                .chars()
                .any(|c| PASSWORD_SPECIALS.contains(&c))
        {
            return Err(ValidationError::InvalidPassword);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            full_name: "Alice Smith".to_string(),
            email: "alice@example.com".to_string(),
            username: "alice99".to_string(),
            password: "Str0ng@pass".to_string(),
            gender: Gender::Female,
        }
    }

    #[test]
    fn accepts_valid_registration() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn rejects_full_name_with_digits() {
        let mut request = valid_request();
        request.full_name = "Alice 99".to_string();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidFullName)
        ));
    }

    #[test]
    fn rejects_blank_full_name() {
        let mut request = valid_request();
        request.full_name = "   ".to_string();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidFullName)
        ));
    }

    #[test]
    fn rejects_email_without_at() {
        let mut request = valid_request();
        request.email = "alice.example.com".to_string();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidEmail)
        ));
    }

    #[test]
    fn rejects_username_without_digit() {
        let mut request = valid_request();
        request.username = "alice".to_string();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidUsername)
        ));
    }

    #[test]
    fn rejects_username_with_symbols() {
        let mut request = valid_request();
        request.username = "alice_99".to_string();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidUsername)
        ));
    }

    #[test]
    fn rejects_password_missing_special() {
        let mut request = valid_request();
        request.password = "Str0ngpass".to_string();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidPassword)
        ));
    }

    #[test]
    fn rejects_short_password() {
        let mut request = valid_request();
        request.password = "S0@a".to_string();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidPassword)
        ));
    }

    #[test]
    fn role_names_are_sorted() {
        let user = User {
            id: Uuid::now_v7(),
            full_name: "Alice Smith".to_string(),
            username: "alice99".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            gender: Gender::Female,
            date_joined: Utc::now(),
            updated_at: Utc::now(),
            display_photo: None,
            business_name: None,
            enabled: true,
            roles: vec![
                Role {
                    id: Uuid::now_v7(),
                    name: roles::USER.to_string(),
                },
                Role {
                    id: Uuid::now_v7(),
                    name: roles::ADMIN.to_string(),
                },
            ],
        };

        assert_eq!(user.role_names(), vec!["ADMIN", "USER"]);
        assert!(user.has_role(roles::ADMIN));
        assert!(!user.has_role("GUEST"));
    }
}
