use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use notification_cell::AppointmentSummary;
use shared_database::StoreError;
use shared_models::error::AppError;

pub const MIN_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| AppointmentError::Validation(format!("Invalid status: {}", value)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_email: String,
    pub lawyer_id: String,
    pub lawyer_name: String,
    pub specialty: String,
    pub requested_date: NaiveDate,
    /// `HH:MM:SS` in business time.
    pub requested_time: String,
    /// `requested_date + requested_time` at the business offset, in UTC.
    pub date_time: DateTime<Utc>,
    pub description: String,
    #[serde(default)]
    pub price_label: String,
    pub status: AppointmentStatus,
    pub requested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    pub fn summary(&self) -> AppointmentSummary {
        AppointmentSummary {
            appointment_id: self.id.clone(),
            user_name: self.patient_name.clone(),
            user_email: self.patient_email.clone(),
            lawyer_name: self.lawyer_name.clone(),
            requested_date: self.requested_date,
            requested_time: self.requested_time.clone(),
            description: self.description.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAppointmentRequest {
    pub patient_id: String,
    pub patient_name: String,
    pub patient_email: String,
    pub lawyer_id: String,
    pub lawyer_name: String,
    pub specialty: String,
    /// `YYYY-MM-DD`
    pub requested_date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub requested_time: String,
    pub description: String,
    #[serde(default)]
    pub price_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTimesQuery {
    pub lawyer_id: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub value: String,
    pub label: String,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub message: String,
    pub appointment: Appointment,
}

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Lawyer not found")]
    LawyerNotFound,

    #[error("This time slot is no longer available")]
    SlotTaken,

    #[error("Appointment was modified by another request, reload and try again")]
    ConcurrentUpdate,

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Lawyer has an unreadable working window")]
    CorruptLawyerWindow,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound | AppointmentError::LawyerNotFound => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::SlotTaken | AppointmentError::ConcurrentUpdate => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::InvalidTransition { .. } => AppError::InvalidTransition(err.to_string()),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::App(app) => app,
            other => AppError::DependencyFailure(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn tally<'a>(appointments: impl IntoIterator<Item = &'a Appointment>) -> Self {
        let mut counts = StatusCounts::default();
        for appointment in appointments {
            counts.total += 1;
            match appointment.status {
                AppointmentStatus::Pending => counts.pending += 1,
                AppointmentStatus::Confirmed => counts.confirmed += 1,
                AppointmentStatus::Cancelled => counts.cancelled += 1,
                AppointmentStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub appointments: Vec<Appointment>,
    pub counts: StatusCounts,
    pub today_appointments: usize,
    pub monthly_appointments: usize,
    pub total_revenue_cents: i64,
    pub total_revenue_label: String,
    pub top_lawyers: Vec<RankedEntry>,
    pub top_specialties: Vec<RankedEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAppointments {
    pub user_id: String,
    pub counts: StatusCounts,
    pub pending: Vec<Appointment>,
    pub confirmed: Vec<Appointment>,
    pub cancelled: Vec<Appointment>,
    pub completed: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub total_appointments: usize,
    pub pending_appointments: usize,
    pub confirmed_appointments: usize,
    pub last_contact: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientsOverview {
    pub clients: Vec<ClientSummary>,
    pub total_clients: usize,
    pub total_appointments: usize,
    pub total_pending: usize,
    pub total_confirmed: usize,
}
