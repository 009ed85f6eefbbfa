use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

pub use crate::collections::{SESSIONS_COLLECTION, USERS_COLLECTION};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// Stored account. Lawyers are `Admin` users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub verification_token: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn to_public(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            email_verified: self.email_verified,
            created_at: self.created_at,
        }
    }
}

/// Account as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Validated caller identity, built once at the request boundary and handed to
/// every service call.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub user_id: String,
    pub role: Role,
    pub token: String,
}

impl SessionContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator access required".to_string()))
        }
    }

    /// Owners may act on their own records, admins on everything.
    pub fn require_owner_or_admin(&self, owner_id: &str) -> Result<(), AppError> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not authorized to access this resource".to_string()))
        }
    }
}

impl From<&SessionRecord> for SessionContext {
    fn from(record: &SessionRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            role: record.role,
            token: record.token.clone(),
        }
    }
}
