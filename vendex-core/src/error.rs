use thiserror::Error;

/// Infrastructure-level failures surfaced by the credential store and the
/// other leaf collaborators. Workflow-level outcomes live in
/// [`crate::auth::AuthError`].
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound(err.to_string()),
            other => CoreError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
