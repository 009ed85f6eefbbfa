use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

use crate::services::schedule::parse_time_of_day;

pub const MAX_BIO_CHARS: usize = 500;

/// Weekly working window of a lawyer. Stored with id = the lawyer's user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LawyerAvailability {
    pub id: String,
    pub lawyer_id: String,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub appointment_price_cents: i64,
    pub appointment_price_label: String,
    pub available_from_week_day: u8,
    pub available_to_week_day: u8,
    pub available_from_time: String,
    pub available_to_time: String,
    #[serde(default)]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LawyerAvailability {
    /// Weekday range is inclusive and never wraps past Saturday.
    pub fn works_on(&self, weekday: u8) -> bool {
        weekday >= self.available_from_week_day && weekday <= self.available_to_week_day
    }

    pub fn from_time(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.available_from_time)
    }

    pub fn to_time(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.available_to_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertLawyerRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub specialty: String,
    pub appointment_price_cents: i64,
    pub available_from_week_day: i64,
    pub available_to_week_day: i64,
    pub available_from_time: String,
    pub available_to_time: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Login handed out once when a lawyer account is provisioned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LawyerCredentials {
    pub email: String,
    pub temporary_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertLawyerResponse {
    pub lawyer: LawyerAvailability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<LawyerCredentials>,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LawyerDeletion {
    pub lawyer_id: String,
    pub name: String,
    pub appointments_removed: usize,
    pub sessions_removed: usize,
}

#[derive(Error, Debug)]
pub enum LawyerError {
    #[error("Lawyer not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Could not allocate a unique login e-mail")]
    EmailExhausted,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<LawyerError> for AppError {
    fn from(err: LawyerError) -> Self {
        match err {
            LawyerError::NotFound => AppError::NotFound("Lawyer not found".to_string()),
            LawyerError::Validation(msg) => AppError::ValidationError(msg),
            LawyerError::Store(StoreError::NotFound(_)) => AppError::NotFound("Lawyer not found".to_string()),
            LawyerError::Store(StoreError::Conflict(msg)) => AppError::Conflict(msg),
            LawyerError::App(app) => app,
            other => AppError::DependencyFailure(other.to_string()),
        }
    }
}
