use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::models::{AppointmentError, AppointmentStatus};

pub fn allowed_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    match from {
        AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
        AppointmentStatus::Confirmed => &[AppointmentStatus::Cancelled, AppointmentStatus::Completed],
        AppointmentStatus::Cancelled | AppointmentStatus::Completed => &[],
    }
}

pub fn validate_transition(from: AppointmentStatus, to: AppointmentStatus) -> Result<(), AppointmentError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(AppointmentError::InvalidTransition { from, to })
    }
}

pub fn status_message(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Confirmed => "Appointment confirmed successfully",
        AppointmentStatus::Cancelled => "Appointment cancelled successfully",
        AppointmentStatus::Completed => "Appointment completed successfully",
        AppointmentStatus::Pending => "Appointment updated successfully",
    }
}

/// Store patch for a validated transition. `confirmedAt` is stamped only on confirmation.
pub fn transition_patch(to: AppointmentStatus, notes: Option<&str>, now: DateTime<Utc>) -> Value {
    let mut patch = json!({
        "status": to,
        "updatedAt": now,
    });

    if to == AppointmentStatus::Confirmed {
        patch["confirmedAt"] = json!(now);
    }
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        patch["notes"] = json!(notes);
    }
    patch
}
