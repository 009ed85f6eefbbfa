use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Timelike};
use tracing::{debug, instrument};

use lawyer_cell::services::schedule::{generate_time_slots, minutes_since_midnight, parse_time_of_day, slot_label, weekday_index};
use lawyer_cell::{LawyerAvailability, LawyerRepository};
use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_models::auth::SessionContext;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, TimeSlot};
use crate::services::clock::{business_date, business_instant, business_offset, parse_date};
use crate::services::repository::AppointmentRepository;

/// Bookable slots of `lawyer` on `date`, each marked available unless a
/// non-cancelled appointment already holds that instant.
pub fn compute_time_slots(
    lawyer: &LawyerAvailability,
    date: NaiveDate,
    appointments: &[Appointment],
    offset: FixedOffset,
) -> Result<Vec<TimeSlot>, AppointmentError> {
    if !lawyer.works_on(weekday_index(date)) {
        return Ok(Vec::new());
    }

    let from = lawyer.from_time().ok_or(AppointmentError::CorruptLawyerWindow)?;
    let to = lawyer.to_time().ok_or(AppointmentError::CorruptLawyerWindow)?;
    let (from_minutes, to_minutes) = (minutes_since_midnight(from), minutes_since_midnight(to));

    let taken: Vec<_> = appointments
        .iter()
        .filter(|a| a.lawyer_id == lawyer.id)
        .filter(|a| a.status != AppointmentStatus::Cancelled)
        .filter(|a| business_date(a.date_time, offset) == date)
        .map(|a| a.date_time)
        .collect();

    // a close time past the hour still admits that hour's :30 mark
    let end_hour = if to.minute() > 0 { to.hour() + 1 } else { to.hour() };
    let slots = generate_time_slots(Some(from.hour() as i32), Some(end_hour as i32));

    Ok(slots
        .into_iter()
        .filter_map(|value| parse_time_of_day(&value).map(|time| (value, time)))
        .filter(|(_, time)| {
            let minutes = minutes_since_midnight(*time);
            minutes > from_minutes && minutes < to_minutes
        })
        .map(|(value, time)| {
            let instant = business_instant(date, time, offset);
            TimeSlot {
                label: slot_label(&value),
                available: !taken.contains(&instant),
                value,
            }
        })
        .collect())
}

pub struct AvailabilityService {
    lawyers: LawyerRepository,
    appointments: AppointmentRepository,
    offset: FixedOffset,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            lawyers: LawyerRepository::new(store.clone()),
            appointments: AppointmentRepository::new(store),
            offset: business_offset(config.business_utc_offset_minutes),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub async fn load_lawyer(&self, lawyer_id: &str) -> Result<LawyerAvailability, AppointmentError> {
        self.lawyers
            .get(lawyer_id)
            .await?
            .ok_or(AppointmentError::LawyerNotFound)
    }

    pub async fn slots_for(&self, lawyer: &LawyerAvailability, date: NaiveDate) -> Result<Vec<TimeSlot>, AppointmentError> {
        let appointments = self.appointments.list_for_lawyer(&lawyer.id).await?;
        compute_time_slots(lawyer, date, &appointments, self.offset)
    }

    #[instrument(skip(self, session), fields(user = %session.user_id))]
    pub async fn get_available_times(
        &self,
        session: &SessionContext,
        lawyer_id: &str,
        date: &str,
    ) -> Result<Vec<TimeSlot>, AppointmentError> {
        let date = parse_date(date)
            .ok_or_else(|| AppointmentError::Validation("date must be YYYY-MM-DD".to_string()))?;

        let lawyer = self.load_lawyer(lawyer_id).await?;
        let slots = self.slots_for(&lawyer, date).await?;

        debug!(
            "{} slots for lawyer {} on {} ({} available)",
            slots.len(),
            lawyer_id,
            date,
            slots.iter().filter(|s| s.available).count()
        );
        Ok(slots)
    }
}
