use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use vendex_core::auth::{AuthError, TokenError};
use vendex_core::error::CoreError;
use vendex_core::users::ValidationError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

// Convert from various error types
impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmailDomain
            | AuthError::InvalidConfirmationToken => {
                Self::bad_request(err.to_string())
            }
            AuthError::EmailExists | AuthError::UsernameTaken => {
                Self::conflict(err.to_string())
            }
            AuthError::InvalidCredentials => {
                Self::unauthorized(err.to_string())
            }
            AuthError::AccountDisabled => Self::forbidden(err.to_string()),
            AuthError::MissingDefaultRole => {
                tracing::error!(error = %err, "role catalog is not seeded");
                Self::internal("Registration is temporarily unavailable")
            }
            AuthError::MailDelivery(mail_err) => {
                tracing::error!(error = %mail_err, "verification email dispatch failed");
                Self::internal("Failed to send verification email")
            }
            AuthError::Token(TokenError::Invalid) => {
                Self::unauthorized(TokenError::Invalid.to_string())
            }
            AuthError::Token(token_err) => {
                tracing::error!(error = %token_err, "token codec failure");
                Self::internal("Authentication is temporarily unavailable")
            }
            AuthError::Store(CoreError::NotFound(msg)) => Self::not_found(msg),
            AuthError::Store(CoreError::Conflict(msg)) => Self::conflict(msg),
            AuthError::Store(core_err) => {
                tracing::error!(error = %core_err, "credential store operation failed");
                Self::internal("Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}
