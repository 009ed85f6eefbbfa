use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use lawyer_cell::services::schedule::parse_time_of_day;
use notification_cell::{NotificationEvent, NotificationSink};
use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_models::auth::SessionContext;
use shared_utils::validation::{is_valid_email, normalize_email};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, RequestAppointmentRequest, StatusUpdate,
    UpdateStatusRequest, MIN_DESCRIPTION_CHARS,
};
use crate::services::availability::AvailabilityService;
use crate::services::clock::{business_instant, parse_date};
use crate::services::lifecycle::{status_message, transition_patch, validate_transition};
use crate::services::repository::AppointmentRepository;

fn require(value: &str, field: &str) -> Result<String, AppointmentError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppointmentError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

pub struct BookingService {
    availability: AvailabilityService,
    appointments: AppointmentRepository,
    notifier: Arc<dyn NotificationSink>,
}

impl BookingService {
    pub fn new(config: &AppConfig, store: Arc<dyn DocumentStore>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            availability: AvailabilityService::new(config, store.clone()),
            appointments: AppointmentRepository::new(store),
            notifier,
        }
    }

    /// Validates the request and stores a pending appointment. Returns its id.
    #[instrument(skip(self, session, request), fields(user = %session.user_id, lawyer = %request.lawyer_id))]
    pub async fn request_appointment(
        &self,
        session: &SessionContext,
        request: RequestAppointmentRequest,
    ) -> Result<String, AppointmentError> {
        let patient_id = require(&request.patient_id, "patientId")?;
        let patient_name = require(&request.patient_name, "patientName")?;
        let lawyer_id = require(&request.lawyer_id, "lawyerId")?;
        let lawyer_name = require(&request.lawyer_name, "lawyerName")?;
        let specialty = require(&request.specialty, "specialty")?;

        if !is_valid_email(&request.patient_email) {
            return Err(AppointmentError::Validation("Invalid e-mail".to_string()));
        }

        let requested_date = parse_date(&request.requested_date)
            .ok_or_else(|| AppointmentError::Validation("requestedDate must be YYYY-MM-DD".to_string()))?;
        let requested_time = parse_time_of_day(&request.requested_time)
            .ok_or_else(|| AppointmentError::Validation("requestedTime must be HH:MM".to_string()))?;

        let description = request.description.trim();
        if description.chars().count() < MIN_DESCRIPTION_CHARS {
            return Err(AppointmentError::Validation(format!(
                "Description must have at least {} characters",
                MIN_DESCRIPTION_CHARS
            )));
        }

        session.require_owner_or_admin(&patient_id)?;

        let lawyer = self.availability.load_lawyer(&lawyer_id).await?;
        let time_value = requested_time.format("%H:%M:%S").to_string();

        let slots = self.availability.slots_for(&lawyer, requested_date).await?;
        match slots.iter().find(|slot| slot.value == time_value) {
            None => {
                return Err(AppointmentError::Validation(
                    "Requested time is outside the lawyer's working hours".to_string(),
                ))
            }
            Some(slot) if !slot.available => return Err(AppointmentError::SlotTaken),
            Some(_) => {}
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: format!("appointment_{}", Uuid::new_v4().simple()),
            patient_id,
            patient_name,
            patient_email: normalize_email(&request.patient_email),
            lawyer_id,
            lawyer_name,
            specialty,
            requested_date,
            requested_time: time_value,
            date_time: business_instant(requested_date, requested_time, self.availability.offset()),
            description: description.to_string(),
            price_label: request
                .price_label
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| lawyer.appointment_price_label.clone()),
            status: AppointmentStatus::Pending,
            requested_at: now,
            updated_at: now,
            confirmed_at: None,
            notes: None,
        };

        self.appointments.insert_if_slot_free(&appointment).await?;

        info!(
            "Appointment {} requested with {} at {}",
            appointment.id, appointment.lawyer_id, appointment.date_time
        );
        Ok(appointment.id)
    }

    #[instrument(skip(self, session, request), fields(user = %session.user_id))]
    pub async fn update_appointment_status(
        &self,
        session: &SessionContext,
        appointment_id: &str,
        request: UpdateStatusRequest,
    ) -> Result<StatusUpdate, AppointmentError> {
        session.require_admin()?;

        let target = AppointmentStatus::from_str(&request.status)?;
        let current = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        validate_transition(current.status, target)?;

        let patch = transition_patch(target, request.notes.as_deref(), Utc::now());
        let updated = self
            .appointments
            .update_if_status(appointment_id, current.status, patch)
            .await?;

        info!("Appointment {} moved from {} to {}", appointment_id, current.status, target);

        let summary = updated.summary();
        let event = match target {
            AppointmentStatus::Confirmed => Some(NotificationEvent::AppointmentConfirmed(summary)),
            AppointmentStatus::Cancelled => Some(NotificationEvent::AppointmentCancelled(summary)),
            AppointmentStatus::Completed => Some(NotificationEvent::AppointmentCompleted(summary)),
            AppointmentStatus::Pending => None,
        };
        if let Some(event) = event {
            debug!("Queueing {} for {}", event.kind(), event.recipient());
            self.notifier.notify(event);
        }

        Ok(StatusUpdate {
            message: status_message(target).to_string(),
            appointment: updated,
        })
    }

    /// Administrative removal. Ignores the lifecycle.
    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn delete_appointment(&self, session: &SessionContext, appointment_id: &str) -> Result<(), AppointmentError> {
        session.require_admin()?;

        if !self.appointments.delete(appointment_id).await? {
            return Err(AppointmentError::NotFound);
        }

        warn!("Appointment {} deleted by {}", appointment_id, session.user_id);
        Ok(())
    }

    pub async fn get_appointment(&self, session: &SessionContext, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        session.require_owner_or_admin(&appointment.patient_id)?;
        Ok(appointment)
    }
}
