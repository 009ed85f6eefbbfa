use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Appointment details carried into e-mail templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSummary {
    pub appointment_id: String,
    pub user_name: String,
    pub user_email: String,
    pub lawyer_name: String,
    pub requested_date: NaiveDate,
    pub requested_time: String,
    pub description: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    AppointmentConfirmed(AppointmentSummary),
    AppointmentCancelled(AppointmentSummary),
    AppointmentCompleted(AppointmentSummary),
    EmailConfirmation {
        user_name: String,
        user_email: String,
        confirmation_url: String,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::AppointmentConfirmed(_) => "appointment_confirmed",
            NotificationEvent::AppointmentCancelled(_) => "appointment_cancelled",
            NotificationEvent::AppointmentCompleted(_) => "appointment_completed",
            NotificationEvent::EmailConfirmation { .. } => "email_confirmation",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            NotificationEvent::AppointmentConfirmed(summary)
            | NotificationEvent::AppointmentCancelled(summary)
            | NotificationEvent::AppointmentCompleted(summary) => &summary.user_email,
            NotificationEvent::EmailConfirmation { user_email, .. } => user_email,
        }
    }
}

/// Payload posted to the mail API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}
