use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::auth::User;
use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmEmailRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("An account with this e-mail already exists")]
    EmailTaken,

    #[error("Invalid e-mail or password")]
    InvalidCredentials,

    #[error("Confirm your e-mail before signing in")]
    EmailNotVerified,

    #[error("Invalid or expired confirmation token")]
    UnknownConfirmationToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::EmailTaken => AppError::Conflict(err.to_string()),
            AuthError::InvalidCredentials | AuthError::EmailNotVerified => {
                AppError::Unauthenticated(err.to_string())
            }
            AuthError::UnknownConfirmationToken | AuthError::UserNotFound => {
                AppError::NotFound(err.to_string())
            }
            AuthError::App(app) => app,
            other => AppError::DependencyFailure(other.to_string()),
        }
    }
}
