use std::sync::Arc;

use serde_json::Value;

use shared_database::{
    store::{from_document, from_documents, to_document},
    DocumentStore, Filter, OrderBy, StoreError,
};
use shared_models::collections::APPOINTMENTS_COLLECTION;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// Filters describing "another live appointment holds this lawyer/instant".
pub fn slot_conflict_filters(appointment: &Appointment) -> Result<Vec<Filter>, StoreError> {
    Ok(vec![
        Filter::eq("lawyerId", appointment.lawyer_id.as_str()),
        Filter::eq("dateTime", serde_json::to_value(appointment.date_time)?),
        Filter::neq("status", AppointmentStatus::Cancelled.as_str()),
    ])
}

#[derive(Clone)]
pub struct AppointmentRepository {
    store: Arc<dyn DocumentStore>,
}

impl AppointmentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Atomic check-and-insert against [`slot_conflict_filters`].
    pub async fn insert_if_slot_free(&self, appointment: &Appointment) -> Result<(), AppointmentError> {
        let conflicts = slot_conflict_filters(appointment)?;

        match self.store
            .insert_unique(APPOINTMENTS_COLLECTION, &appointment.id, to_document(appointment)?, &conflicts)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict(_)) => Err(AppointmentError::SlotTaken),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, appointment_id: &str) -> Result<Option<Appointment>, AppointmentError> {
        match self.store.get(APPOINTMENTS_COLLECTION, appointment_id).await? {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    pub async fn list_for_lawyer(&self, lawyer_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let documents = self.store
            .query(APPOINTMENTS_COLLECTION, &[Filter::eq("lawyerId", lawyer_id)], None)
            .await?;
        Ok(from_documents(documents)?)
    }

    /// Newest request first.
    pub async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let documents = self.store
            .query(
                APPOINTMENTS_COLLECTION,
                &[Filter::eq("patientId", patient_id)],
                Some(&OrderBy::desc("requestedAt")),
            )
            .await?;
        Ok(from_documents(documents)?)
    }

    /// Newest request first.
    pub async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentError> {
        let documents = self.store
            .query(APPOINTMENTS_COLLECTION, &[], Some(&OrderBy::desc("requestedAt")))
            .await?;
        Ok(from_documents(documents)?)
    }

    /// Applies `patch` only while the stored status still equals `expected`.
    pub async fn update_if_status(
        &self,
        appointment_id: &str,
        expected: AppointmentStatus,
        patch: Value,
    ) -> Result<Appointment, AppointmentError> {
        let guard = [Filter::eq("status", expected.as_str())];

        match self.store.update(APPOINTMENTS_COLLECTION, appointment_id, patch, &guard).await {
            Ok(document) => Ok(from_document(document)?),
            Err(StoreError::Conflict(_)) => Err(AppointmentError::ConcurrentUpdate),
            Err(StoreError::NotFound(_)) => Err(AppointmentError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, appointment_id: &str) -> Result<bool, AppointmentError> {
        Ok(self.store.delete(APPOINTMENTS_COLLECTION, appointment_id).await?)
    }
}
